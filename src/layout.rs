use crate::width_spec::{Column, WidthSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFrame {
    Ordered { next_ordinal: u32 },
    Unordered,
}

/// Cursor, indentation and list context for a single walk.
///
/// Coordinates are logical: y grows without bound and is only later mapped
/// into chunks. y never decreases, which lets the width spec advance lazily.
#[derive(Debug)]
pub struct LayoutState {
    width_spec: WidthSpec,
    column: Column,
    x: i32,
    y: i32,
    line_height: i32,
    indents: Vec<i32>,
    indent: i32,
    lists: Vec<ListFrame>,
    in_preformatted: bool,
}

impl LayoutState {
    pub fn new(mut width_spec: WidthSpec) -> Self {
        let column = width_spec.active_column(0);
        Self {
            width_spec,
            column,
            x: column.start_x,
            y: 0,
            line_height: 0,
            indents: Vec::new(),
            indent: 0,
            lists: Vec::new(),
            in_preformatted: false,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn indent(&self) -> i32 {
        self.indent
    }

    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    pub fn image_width(&self) -> u32 {
        self.width_spec.image_width()
    }

    pub fn line_start(&self) -> i32 {
        self.column.start_x.saturating_add(self.indent)
    }

    pub fn at_line_start(&self) -> bool {
        self.x <= self.line_start()
    }

    pub fn advance_x(&mut self, dx: i32) {
        self.x = self.x.saturating_add(dx);
    }

    pub fn grow_line(&mut self, height: i32) {
        self.line_height = self.line_height.max(height);
    }

    /// Moves to the start of the next line, `margin` below the current line.
    /// Returns the vertical distance travelled.
    pub fn newline(&mut self, margin: i32) -> i32 {
        let dy = (self.line_height + margin).max(0);
        self.y = self.y.saturating_add(dy);
        self.column = self.width_spec.active_column(self.y);
        self.x = self.line_start();
        self.line_height = 0;
        dy
    }

    pub fn push_indent(&mut self, amount: i32) {
        self.indents.push(amount);
        self.indent += amount;
    }

    pub fn pop_indent(&mut self) {
        if let Some(amount) = self.indents.pop() {
            self.indent -= amount;
        }
    }

    pub fn indent_depth(&self) -> usize {
        self.indents.len()
    }

    pub fn push_list(&mut self, frame: ListFrame) {
        self.lists.push(frame);
    }

    pub fn pop_list(&mut self) -> Option<ListFrame> {
        self.lists.pop()
    }

    pub fn current_list(&self) -> Option<ListFrame> {
        self.lists.last().copied()
    }

    /// Returns the ordinal for the next item of the innermost ordered list and
    /// advances the counter. `None` when the innermost list is unordered.
    pub fn take_ordinal(&mut self) -> Option<u32> {
        match self.lists.last_mut() {
            Some(ListFrame::Ordered { next_ordinal }) => {
                let current = *next_ordinal;
                *next_ordinal += 1;
                Some(current)
            }
            _ => None,
        }
    }

    pub fn in_preformatted(&self) -> bool {
        self.in_preformatted
    }

    pub fn set_preformatted(&mut self, value: bool) -> bool {
        std::mem::replace(&mut self.in_preformatted, value)
    }
}
