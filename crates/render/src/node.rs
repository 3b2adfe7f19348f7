//! Render-node tree: the rendered document as nested boxes.
//!
//! Layout is deliberately simple. A node stacks its children vertically or
//! horizontally, its height is the larger of its minimum height and its
//! content, and widths resolve top-down from the page width.

use image::Rgb;

/// Height of one printed text line.
pub const LINE_HEIGHT_PX: u32 = 18;

/// Horizontal space taken by one character when text is drawn.
pub const CHAR_WIDTH_PX: u32 = 7;

pub const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
pub const INK: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Take the remaining space (shared evenly with other `Fill` siblings).
    Fill,
    Px(u32),
    Percent(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderNode {
    pub tag: &'static str,
    pub axis: Axis,
    pub width: Width,
    pub min_height_px: u32,
    pub padding_px: u32,
    pub background: Option<Rgb<u8>>,
    pub border: Option<Rgb<u8>>,
    pub ink: Rgb<u8>,
    pub text: Vec<String>,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    /// A box that stacks its children top to bottom.
    pub fn block(tag: &'static str) -> Self {
        Self {
            tag,
            axis: Axis::Vertical,
            width: Width::Fill,
            min_height_px: 0,
            padding_px: 0,
            background: None,
            border: None,
            ink: INK,
            text: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A box that lays its children out left to right.
    pub fn row(tag: &'static str) -> Self {
        Self {
            axis: Axis::Horizontal,
            ..Self::block(tag)
        }
    }

    /// A padded text box; one entry per line of `text`.
    pub fn text(tag: &'static str, text: &str) -> Self {
        Self::block(tag).with_padding(6).with_text(text)
    }

    pub fn with_width(mut self, width: Width) -> Self {
        self.width = width;
        self
    }

    pub fn with_min_height(mut self, px: u32) -> Self {
        self.min_height_px = px;
        self
    }

    pub fn with_padding(mut self, px: u32) -> Self {
        self.padding_px = px;
        self
    }

    pub fn with_background(mut self, color: Rgb<u8>) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_border(mut self, color: Rgb<u8>) -> Self {
        self.border = Some(color);
        self
    }

    pub fn with_ink(mut self, color: Rgb<u8>) -> Self {
        self.ink = color;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = if text.is_empty() {
            Vec::new()
        } else {
            text.lines().map(str::to_string).collect()
        };
        self
    }

    pub fn with_child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RenderNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_empty() && self.min_height_px == 0
    }

    /// Width this node takes inside a parent offering `available` pixels.
    pub fn resolve_width(&self, available: u32) -> u32 {
        match self.width {
            Width::Fill => available,
            Width::Px(px) => px.min(available),
            Width::Percent(p) => available * u32::from(p.min(100)) / 100,
        }
    }

    /// Widths of the children for a content box `inner` pixels wide.
    pub fn child_widths(&self, inner: u32) -> Vec<u32> {
        match self.axis {
            Axis::Vertical => self
                .children
                .iter()
                .map(|c| c.resolve_width(inner))
                .collect(),
            Axis::Horizontal => {
                let fixed: u32 = self
                    .children
                    .iter()
                    .filter(|c| c.width != Width::Fill)
                    .map(|c| c.resolve_width(inner))
                    .sum();
                let fills = self
                    .children
                    .iter()
                    .filter(|c| c.width == Width::Fill)
                    .count() as u32;
                let share = inner.saturating_sub(fixed).checked_div(fills).unwrap_or(0);
                self.children
                    .iter()
                    .map(|c| match c.width {
                        Width::Fill => share,
                        _ => c.resolve_width(inner),
                    })
                    .collect()
            }
        }
    }

    pub fn inner_width(&self, width: u32) -> u32 {
        width.saturating_sub(2 * self.padding_px)
    }

    /// Laid-out height of this node when it is `width` pixels wide.
    pub fn measure_height(&self, width: u32) -> u32 {
        let inner = self.inner_width(width);
        let text = self.text.len() as u32 * LINE_HEIGHT_PX;
        let widths = self.child_widths(inner);
        let children = self.children.iter().zip(widths);
        let children_height = match self.axis {
            Axis::Vertical => children.map(|(c, w)| c.measure_height(w)).sum(),
            Axis::Horizontal => children.map(|(c, w)| c.measure_height(w)).max().unwrap_or(0),
        };
        let content = text + children_height;
        let padded = if content == 0 {
            0
        } else {
            content + 2 * self.padding_px
        };
        padded.max(self.min_height_px)
    }

    /// Depth-first search by tag.
    pub fn find(&self, tag: &str) -> Option<&RenderNode> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }

    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a RenderNode>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in &self.children {
            child.find_all(tag, out);
        }
    }
}
