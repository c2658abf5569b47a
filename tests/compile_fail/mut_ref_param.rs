//! A mutable borrow of a record is never inferred as a parameter.

use msgbridge::{Record, adapt};

#[derive(Debug, Clone, Default, Record)]
#[record(name = "shop.Item")]
struct Item {
    count: u32,
}

fn main() {
    let _bump = adapt!(|item: &mut Item| { item.count += 1; });
}
