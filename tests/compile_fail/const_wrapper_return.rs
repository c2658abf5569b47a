//! Only `Value` wrappers can be returned.

use msgbridge::{ConstKind, Record, Wrapped, adapt};

#[derive(Debug, Clone, Default, Record)]
#[record(name = "shop.Item")]
struct Item {
    count: u32,
}

fn view(item: Wrapped<'_, Item, ConstKind>) -> Wrapped<'_, Item, ConstKind> {
    item
}

fn main() {
    let _view = adapt!(view as fn(Wrapped<'_, Item, ConstKind>) -> Wrapped<'_, Item, ConstKind>);
}
