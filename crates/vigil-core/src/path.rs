//! [`TreePath`] — a validated address into the document tree.
//!
//! Paths are `/`-separated lists of segments. A segment is a non-empty string
//! that contains none of the characters the tree reserves (`/ . # $ [ ]`) and
//! no control characters. The root is the empty path and renders as `/`.

use std::fmt;

use crate::{Error, Result};

const RESERVED: &[char] = &['/', '.', '#', '$', '[', ']'];

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath {
  segments: Vec<String>,
}

impl TreePath {
  pub fn root() -> Self { Self::default() }

  /// Parse a path such as `/tenants/acme/alerts`. Leading and trailing
  /// slashes are ignored; empty interior segments are rejected.
  pub fn parse(raw: &str) -> Result<Self> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
      return Ok(Self::root());
    }
    let mut path = Self::root();
    for segment in trimmed.split('/') {
      path = path.child(segment)?;
    }
    Ok(path)
  }

  /// Return a new path with `segment` appended.
  pub fn child(&self, segment: impl AsRef<str>) -> Result<Self> {
    let segment = segment.as_ref();
    validate_segment(segment)?;
    let mut segments = self.segments.clone();
    segments.push(segment.to_owned());
    Ok(Self { segments })
  }

  pub fn segments(&self) -> &[String] { &self.segments }

  pub fn is_root(&self) -> bool { self.segments.is_empty() }

  /// The last segment, or `None` at the root.
  pub fn key(&self) -> Option<&str> { self.segments.last().map(String::as_str) }

  pub fn parent(&self) -> Option<Self> {
    if self.is_root() {
      return None;
    }
    let mut segments = self.segments.clone();
    segments.pop();
    Some(Self { segments })
  }

  /// Whether `self` equals `ancestor` or lies beneath it.
  pub fn starts_with(&self, ancestor: &TreePath) -> bool {
    self.segments.starts_with(&ancestor.segments)
  }
}

fn validate_segment(segment: &str) -> Result<()> {
  if segment.is_empty()
    || segment.contains(RESERVED)
    || segment.chars().any(char::is_control)
  {
    return Err(Error::InvalidPath(segment.to_owned()));
  }
  Ok(())
}

impl fmt::Display for TreePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_root() {
      return f.write_str("/");
    }
    for segment in &self.segments {
      write!(f, "/{segment}")?;
    }
    Ok(())
  }
}
