//! An optional mutable borrow is rejected like the plain one.

use msgbridge::{Record, adapt};

#[derive(Debug, Clone, Default, Record)]
#[record(name = "shop.Item")]
struct Item {
    count: u32,
}

fn main() {
    let _bump = adapt!(|item: Option<&mut Item>| { if let Some(i) = item { i.count += 1; } });
}
