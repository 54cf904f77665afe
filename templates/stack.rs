//! Last-in, first-out collection backed by a vector

use std::fmt;

/// Types that can describe their contents as text
pub trait Render {
    fn render(&self) -> String;
}

pub trait Stack<T>: Render {
    /// Add an item on top. Returns false if the item was not accepted.
    fn push(&mut self, item: T) -> bool;
    /// Remove and return the top item
    fn pop(&mut self) -> Option<T>;
    fn length(&self) -> usize;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackTemplate(Vec<Element>);

impl StackTemplate {
    pub fn new() -> StackTemplate {
        StackTemplate(Vec::new())
    }

    /// The top item, left in place
    pub fn peek(&self) -> Option<&Element> {
        self.0.last()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Stack<Element> for StackTemplate {
    fn push(&mut self, item: Element) -> bool {
        self.0.push(item);
        true
    }

    fn pop(&mut self) -> Option<Element> {
        self.0.pop()
    }

    fn length(&self) -> usize {
        self.0.len()
    }
}

impl Render for StackTemplate {
    fn render(&self) -> String {
        format!("{:?}", self.0)
    }
}

impl fmt::Display for StackTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
