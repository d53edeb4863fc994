//! Values exchanged across the plugin boundary and their shape rules.
//!
//! Both plugin roles hand nested structures of frames, paths, and absent
//! entries across the boundary. [`Value`] makes that structure explicit; the
//! validators here enforce the grammar
//!
//! ```text
//! V  ::= Frame | Null | Path | List<V'>
//! V' ::= Frame | Null | Path
//! ```
//!
//! in one of two forms: the *path form* for `chunk` returns and the *frame
//! form* for source `stream` returns.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::PluginError;
use crate::frame::Frame;

/// A value handed across the plugin boundary.
#[derive(Debug, Clone)]
pub enum Value {
    /// A columnar frame.
    Frame(Frame),
    /// An absent entry (no data for this position).
    Null,
    /// A file location, relative to the working directory unless the plugin
    /// says otherwise.
    Path(PathBuf),
    /// Several entries bound to one position.
    List(Vec<Value>),
}

impl Value {
    /// Path value.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// List value.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Name of this value's variant, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Frame(_) => "frame",
            Self::Null => "null",
            Self::Path(_) => "path",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Frames at this value's top level or directly inside its list.
    pub fn frames(&self) -> Box<dyn Iterator<Item = &Frame> + '_> {
        match self {
            Self::Frame(frame) => Box::new(std::iter::once(frame)),
            Self::List(items) => Box::new(items.iter().filter_map(Value::as_frame)),
            Self::Null | Self::Path(_) => Box::new(std::iter::empty()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(frame) => write!(f, "{frame}"),
            Self::Null => f.write_str("null"),
            Self::Path(path) => write!(f, "{:?}", path.display().to_string()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<Frame> for Value {
    fn from(frame: Frame) -> Self {
        Self::Frame(frame)
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Value {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for Value {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for Value {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

/// One validated positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param<T> {
    /// The parameter receives one entry, possibly absent.
    Single(Option<T>),
    /// The parameter receives a list of entries, each possibly absent.
    Multiple(Vec<Option<T>>),
}

impl<T> Param<T> {
    /// Apply a fallible conversion to every present entry, keeping shape.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<Param<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        match self {
            Self::Single(item) => Ok(Param::Single(item.map(&mut f).transpose()?)),
            Self::Multiple(items) => items
                .into_iter()
                .map(|item| item.map(&mut f).transpose())
                .collect::<Result<Vec<_>, E>>()
                .map(Param::Multiple),
        }
    }

    /// Present entries, in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let items: Vec<&T> = match self {
            Self::Single(item) => item.iter().collect(),
            Self::Multiple(items) => items.iter().flatten().collect(),
        };
        items.into_iter()
    }
}

impl From<Param<Frame>> for Value {
    fn from(param: Param<Frame>) -> Self {
        match param {
            Param::Single(item) => item.into(),
            Param::Multiple(items) => Self::list(items),
        }
    }
}

impl From<Param<PathBuf>> for Value {
    fn from(param: Param<PathBuf>) -> Self {
        match param {
            Param::Single(item) => item.into(),
            Param::Multiple(items) => Self::list(items),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Path,
    Frame,
}

impl Form {
    fn expected(self) -> &'static str {
        match self {
            Self::Path => "a path, null, or a list of paths and nulls",
            Self::Frame => "a frame, null, or a list of frames and nulls",
        }
    }

    fn accepts_leaf(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Path, Value::Path(_)) | (Self::Frame, Value::Frame(_)) => {
                true
            }
            (Self::Path, Value::Frame(_)) | (Self::Frame, Value::Path(_)) | (_, Value::List(_)) => {
                false
            }
        }
    }
}

/// Reported when a list appears where only leaves are allowed.
pub(crate) const NESTED_LIST: &str = "list nested inside a list";

fn type_shape(
    location: String,
    form: Form,
    found: &'static str,
    structure: &dyn fmt::Display,
) -> PluginError {
    PluginError::TypeShape {
        location,
        expected: form.expected(),
        found,
        structure: structure.to_string(),
    }
}

/// Frame-form violation found outside the positional validators.
pub(crate) fn frame_shape_error(
    location: String,
    found: &'static str,
    structure: &dyn fmt::Display,
) -> PluginError {
    type_shape(location, Form::Frame, found, structure)
}

fn check_position(
    form: Form,
    position: usize,
    value: &Value,
    structure: &dyn fmt::Display,
) -> Result<(), PluginError> {
    match value {
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                if !form.accepts_leaf(item) {
                    let found = match item {
                        Value::List(_) => NESTED_LIST,
                        other => other.type_name(),
                    };
                    return Err(type_shape(
                        format!("position {position}[{i}]"),
                        form,
                        found,
                        structure,
                    ));
                }
            }
            Ok(())
        }
        leaf if form.accepts_leaf(leaf) => Ok(()),
        other => Err(type_shape(
            format!("position {position}"),
            form,
            other.type_name(),
            structure,
        )),
    }
}

/// Validate a `chunk` return value and split it into positional parameters.
///
/// A top-level [`Value::List`] is the ordered parameter list; any other value
/// is a single parameter. Each parameter is a path, null, or a list of paths
/// and nulls.
///
/// # Errors
///
/// Returns [`PluginError::TypeShape`] on the first non-conforming entry.
pub fn validate_chunk_output(value: Value) -> Result<Vec<Param<PathBuf>>, PluginError> {
    let positions = match value {
        Value::List(items) => items,
        single => vec![single],
    };
    let structure = ListDisplay(&positions);
    for (position, item) in positions.iter().enumerate() {
        check_position(Form::Path, position, item, &structure)?;
    }
    Ok(positions.into_iter().map(into_path_param).collect())
}

/// Validate the positional list returned by a source `stream`.
///
/// # Errors
///
/// Returns [`PluginError::TypeShape`] on the first non-conforming entry.
pub fn validate_frame_output(values: &[Value]) -> Result<(), PluginError> {
    let structure = ListDisplay(values);
    for (position, item) in values.iter().enumerate() {
        check_position(Form::Frame, position, item, &structure)?;
    }
    Ok(())
}

fn into_path_param(value: Value) -> Param<PathBuf> {
    fn leaf(value: Value) -> Option<PathBuf> {
        match value {
            Value::Path(path) => Some(path),
            Value::Null | Value::Frame(_) | Value::List(_) => None,
        }
    }
    match value {
        Value::List(items) => Param::Multiple(items.into_iter().map(leaf).collect()),
        other => Param::Single(leaf(other)),
    }
}

struct ListDisplay<'a>(&'a [Value]);

impl fmt::Display for ListDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
