use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::analysis::edges::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkItem {
    Instruction(Node),
}

impl WorkItem {
    pub fn node(self) -> Node {
        match self {
            WorkItem::Instruction(node) => node,
        }
    }
}

/// Which pending item is processed next. The fixpoint does not depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOrder {
    #[default]
    Fifo,
    Lifo,
}

/// Pending work without duplicates: an item already queued is not queued again.
#[derive(Debug, Default)]
pub struct Worklist {
    queue: VecDeque<WorkItem>,
    queued: HashSet<WorkItem>,
    order: SelectionOrder,
}

impl Worklist {
    pub fn with_order(order: SelectionOrder) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    pub fn push(&mut self, item: WorkItem) -> bool {
        if !self.queued.insert(item) {
            return false;
        }
        self.queue.push_back(item);
        true
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        let item = match self.order {
            SelectionOrder::Fifo => self.queue.pop_front(),
            SelectionOrder::Lifo => self.queue.pop_back(),
        }?;
        self.queued.remove(&item);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, item: &WorkItem) -> bool {
        self.queued.contains(item)
    }
}
