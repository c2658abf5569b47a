//! A borrowed record cannot be returned; it would outlive the call.

use msgbridge::{Record, adapt};

#[derive(Debug, Clone, Default, Record)]
#[record(name = "shop.Item")]
struct Item {
    count: u32,
}

fn first(items: &[Item]) -> &Item {
    &items[0]
}

fn main() {
    let _first = adapt!(first as fn(&[Item]) -> &Item);
}
