//! Containers hold records by value only.

use msgbridge::{Record, adapt};

#[derive(Debug, Clone, Default, Record)]
#[record(name = "shop.Item")]
struct Item {
    count: u32,
}

fn main() {
    let _total = adapt!(|items: Vec<&Item>| -> u32 { items.iter().map(|i| i.count).sum() });
}
