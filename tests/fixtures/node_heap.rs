use std::fmt;

/// Types that can describe their contents as text
pub trait Render {
    fn render(&self) -> String;
}

pub trait Heap<T>: Render {
    /// Add an item. Returns false if the item was not accepted.
    fn insert(&mut self, item: T) -> bool;
    /// Remove and return the smallest item
    fn extract(&mut self) -> Option<T>;
    fn length(&self) -> usize;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeHeap(Vec<Node>);

impl NodeHeap {
    pub fn new() -> NodeHeap {
        NodeHeap(Vec::new())
    }

    /// The smallest item, left in place
    pub fn peek(&self) -> Option<&Node> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.0[index] >= self.0[parent] {
                break;
            }
            self.0.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.0.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && self.0[left] < self.0[smallest] {
                smallest = left;
            }
            if right < len && self.0[right] < self.0[smallest] {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.0.swap(index, smallest);
            index = smallest;
        }
    }
}

impl Heap<Node> for NodeHeap {
    fn insert(&mut self, item: Node) -> bool {
        self.0.push(item);
        let last = self.0.len() - 1;
        self.sift_up(last);
        true
    }

    fn extract(&mut self) -> Option<Node> {
        if self.0.is_empty() {
            return None;
        }
        let last = self.0.len() - 1;
        self.0.swap(0, last);
        let smallest = self.0.pop();
        self.sift_down(0);
        smallest
    }

    fn length(&self) -> usize {
        self.0.len()
    }
}

impl Render for NodeHeap {
    fn render(&self) -> String {
        format!("{:?}", self.0)
    }
}

impl fmt::Display for NodeHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
