#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabfilter_core::{
    CellValue, Combinator, ComposedFilter, Entry, FilterObservable, RowFilter, SharedObservable,
    UserFilter,
};

#[derive(Arbitrary, Debug)]
enum Op {
    NewLeaf { modulo: u8 },
    NewComposed { kind: u8 },
    Add { parent: u8, child: u8 },
    Remove { parent: u8, child: u8 },
    Toggle { leaf: u8 },
    Clear { composed: u8 },
    Probe { node: u8, value: i8 },
}

enum Node {
    Leaf(Rc<UserFilter>),
    Composed(Rc<ComposedFilter>),
}

impl Node {
    fn observable(&self) -> SharedObservable {
        match self {
            Node::Leaf(leaf) => leaf.clone() as SharedObservable,
            Node::Composed(composed) => composed.clone() as SharedObservable,
        }
    }
}

fn pick(nodes: &[Node], index: u8) -> Option<&Node> {
    (!nodes.is_empty()).then(|| &nodes[usize::from(index) % nodes.len()])
}

fuzz_target!(|ops: Vec<Op>| {
    let mut nodes: Vec<Node> = Vec::new();
    for op in ops.into_iter().take(128) {
        match op {
            Op::NewLeaf { modulo } => {
                let m = i64::from(modulo.max(1));
                nodes.push(Node::Leaf(UserFilter::from_fn(move |e| {
                    e.value(0)
                        .and_then(CellValue::as_int)
                        .is_some_and(|v| v.rem_euclid(m) == 0)
                })));
            }
            Op::NewComposed { kind } => {
                let combinator = match kind % 3 {
                    0 => Combinator::And,
                    1 => Combinator::Or,
                    _ => Combinator::Not,
                };
                nodes.push(Node::Composed(ComposedFilter::new(combinator)));
            }
            Op::Add { parent, child } => {
                // Only attach older nodes under newer ones so the graph stays
                // acyclic.
                let (p, c) = (usize::from(parent), usize::from(child));
                if nodes.is_empty() {
                    continue;
                }
                let (p, c) = (p % nodes.len(), c % nodes.len());
                if c < p
                    && let Node::Composed(composed) = &nodes[p]
                {
                    composed.add_observable(nodes[c].observable());
                }
            }
            Op::Remove { parent, child } => {
                if let (Some(Node::Composed(composed)), Some(child)) =
                    (pick(&nodes, parent), pick(&nodes, child))
                {
                    composed.remove_observable(child.observable().observable_id());
                }
            }
            Op::Toggle { leaf } => {
                if let Some(Node::Leaf(leaf)) = pick(&nodes, leaf) {
                    leaf.set_enabled(!leaf.is_enabled());
                }
            }
            Op::Clear { composed } => {
                if let Some(Node::Composed(composed)) = pick(&nodes, composed) {
                    composed.clear();
                }
            }
            Op::Probe { node, value } => {
                if let Some(Node::Composed(composed)) = pick(&nodes, node) {
                    let row = vec![Some(CellValue::Int(i64::from(value)))];
                    let _ = composed.include(&row);
                    assert!(composed.active_count() <= composed.observables().len());
                }
            }
        }
    }
    for node in &nodes {
        if let Node::Composed(composed) = node {
            composed.clear();
        }
    }
});
