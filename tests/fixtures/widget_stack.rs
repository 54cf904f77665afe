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
pub struct WidgetStack(Vec<Widget>);

impl WidgetStack {
    pub fn new() -> WidgetStack {
        WidgetStack(Vec::new())
    }

    /// The top item, left in place
    pub fn peek(&self) -> Option<&Widget> {
        self.0.last()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Stack<Widget> for WidgetStack {
    fn push(&mut self, item: Widget) -> bool {
        self.0.push(item);
        true
    }

    fn pop(&mut self) -> Option<Widget> {
        self.0.pop()
    }

    fn length(&self) -> usize {
        self.0.len()
    }
}

impl Render for WidgetStack {
    fn render(&self) -> String {
        format!("{:?}", self.0)
    }
}

impl fmt::Display for WidgetStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
