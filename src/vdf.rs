//! Valve KeyValues (VDF) text writer used for app build manifests.

use crate::error::Error;
use crate::result::Result;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Block(Block),
}

/// An ordered list of key/value entries enclosed in braces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    entries: Vec<(String, Value)>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.entries.push((key.into(), Value::Str(value.into())));
        self
    }

    pub fn block<K: Into<String>>(mut self, key: K, block: Block) -> Self {
        self.entries.push((key.into(), Value::Block(block)));
        self
    }
}

/// A named root block, e.g. `"AppBuild" { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub root: Block,
}

impl Document {
    pub fn new<N: Into<String>>(name: N, root: Block) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Render the document, one tab of indentation per nesting level.
    /// Fails when a key or value contains a character the quoted form cannot carry.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        write_quoted(&mut out, &self.name, &self.name)?;
        out.push('\n');
        write_block(&mut out, &self.root, 0)?;
        Ok(out)
    }
}

fn write_block(out: &mut String, block: &Block, depth: usize) -> Result<()> {
    indent(out, depth);
    out.push_str("{\n");

    for (key, value) in &block.entries {
        indent(out, depth + 1);
        write_quoted(out, key, key)?;
        match value {
            Value::Str(s) => {
                out.push(' ');
                write_quoted(out, key, s)?;
                out.push('\n');
            }
            Value::Block(child) => {
                out.push('\n');
                write_block(out, child, depth + 1)?;
            }
        }
    }

    indent(out, depth);
    out.push_str("}\n");
    Ok(())
}

fn write_quoted(out: &mut String, key: &str, text: &str) -> Result<()> {
    if text.contains(['"', '\r', '\n']) {
        return Err(Error::InvalidValue {
            key: key.to_string(),
            value: text.to_string(),
        });
    }
    // Writing to a String cannot fail
    let _ = write!(out, "\"{}\"", text);
    Ok(())
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}
