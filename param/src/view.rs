use std::cell::{OnceCell, RefCell};
use std::fmt::{self, Write};
use std::rc::Rc;

use crate::{ParamKind, ParamValue, Resource, ResourceSlot};

/// Which side of an algorithm a view presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRole {
    Input,
    Output,
}

/// A presentation of one parameter's value.
pub trait ParamView {
    /// Refresh from the parameter's current value.
    fn update(&mut self, value: &ParamValue);
    /// Current rendering, single line.
    fn render(&self) -> String;
}

/// Builds views for parameters. Injected so parameters never depend on
/// a concrete rendering.
pub trait ViewProvider {
    fn create(&self, role: ViewRole, kind: ParamKind, label: &str) -> Box<dyn ParamView>;
}

/// Shared handle to a built view. Repeated requests return the same handle.
pub type ViewHandle = Rc<RefCell<Box<dyn ParamView>>>;

/// Per-parameter memo of its input and output views.
///
/// Each view is built at most once, on first request.
pub struct ViewFactory {
    provider: Rc<dyn ViewProvider>,
    input: OnceCell<ViewHandle>,
    output: OnceCell<ViewHandle>,
}

impl ViewFactory {
    pub fn new(provider: Rc<dyn ViewProvider>) -> Self {
        Self {
            provider,
            input: OnceCell::new(),
            output: OnceCell::new(),
        }
    }

    /// An empty factory sharing this one's provider.
    pub fn fresh(&self) -> Self {
        Self::new(self.provider.clone())
    }

    pub fn input_view(&self, kind: ParamKind, label: &str, value: &ParamValue) -> ViewHandle {
        self.view(ViewRole::Input, kind, label, value)
    }

    pub fn output_view(&self, kind: ParamKind, label: &str, value: &ParamValue) -> ViewHandle {
        self.view(ViewRole::Output, kind, label, value)
    }

    fn view(&self, role: ViewRole, kind: ParamKind, label: &str, value: &ParamValue) -> ViewHandle {
        let cell = match role {
            ViewRole::Input => &self.input,
            ViewRole::Output => &self.output,
        };
        cell.get_or_init(|| {
            let mut view = self.provider.create(role, kind, label);
            view.update(value);
            Rc::new(RefCell::new(view))
        })
        .clone()
    }

    /// Number of views built so far.
    pub fn built(&self) -> usize {
        self.input.get().is_some() as usize + self.output.get().is_some() as usize
    }

    /// Push `value` into the views that have been built; unbuilt ones stay unbuilt.
    pub fn update(&self, value: &ParamValue) {
        for view in [self.input.get(), self.output.get()].into_iter().flatten() {
            view.borrow_mut().update(value);
        }
    }
}

impl Default for ViewFactory {
    fn default() -> Self {
        Self::new(Rc::new(TextViews))
    }
}

impl fmt::Debug for ViewFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewFactory({} built)", self.built())
    }
}

/// Default provider: plain-text views for printing to a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextViews;

impl ViewProvider for TextViews {
    fn create(&self, role: ViewRole, kind: ParamKind, label: &str) -> Box<dyn ParamView> {
        Box::new(TextView::new(role, kind, label))
    }
}

/// Renders `label = value` for inputs and `label -> value` for outputs.
#[derive(Debug, Clone)]
pub struct TextView {
    role: ViewRole,
    kind: ParamKind,
    label: String,
    text: String,
}

/// Arrays longer than this are abbreviated.
const MAX_SHOWN: usize = 6;

impl TextView {
    pub fn new(role: ViewRole, kind: ParamKind, label: &str) -> Self {
        Self {
            role,
            kind,
            label: label.to_owned(),
            text: String::new(),
        }
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

impl ParamView for TextView {
    fn update(&mut self, value: &ParamValue) {
        self.text.clear();
        // writing to a String is infallible:
        let _ = write_value(&mut self.text, value);
    }

    fn render(&self) -> String {
        match (self.role, self.kind) {
            (_, ParamKind::Collection) => format!("{}:", self.label),
            (ViewRole::Input, _) => format!("{} = {}", self.label, self.text),
            (ViewRole::Output, _) => format!("{} -> {}", self.label, self.text),
        }
    }
}

fn write_value(out: &mut String, value: &ParamValue) -> fmt::Result {
    match value {
        ParamValue::Number(v) => write!(out, "{v}"),
        ParamValue::NumberCollection(v) => write_numbers(out, v),
        ParamValue::File(Some(path)) => write!(out, "{}", path.display()),
        ParamValue::File(None) => out.write_str("<unset>"),
        ParamValue::Object(slot) => write_slot(out, slot),
        ParamValue::Collection(c) => write!(out, "{} entries", c.len()),
        ParamValue::Text(s) => write!(out, "{s:?}"),
    }
}

fn write_numbers(out: &mut String, values: &[f64]) -> fmt::Result {
    out.write_char('[')?;
    for (i, v) in values.iter().take(MAX_SHOWN).enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write!(out, "{v}")?;
    }
    if values.len() > MAX_SHOWN {
        write!(out, ", ... ({} total)", values.len())?;
    }
    out.write_char(']')
}

fn write_slot(out: &mut String, slot: &ResourceSlot) -> fmt::Result {
    match slot.object() {
        Some(Resource::Text(s)) => write!(out, "{} chars of text", s.chars().count())?,
        Some(Resource::Numbers(v)) => write_numbers(out, v)?,
        Some(Resource::Document(doc)) => write!(out, "{doc}")?,
        None => write!(out, "<{}>", slot.resource_type())?,
    }
    match slot.path() {
        Some(path) => write!(out, " ({})", path.display()),
        None => Ok(()),
    }
}
