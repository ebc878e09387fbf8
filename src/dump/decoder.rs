// src/dump/decoder.rs

//! Line decoder for the indentation-nested dump format
//!
//! Each line's depth is its count of leading two-space units. Open maps,
//! lists and `|` blocks are tracked on an explicit frame stack; a line at a
//! shallower depth pops (and finalizes) every deeper frame before it is
//! interpreted, so one line can close several structures at once.
//!
//! Recognized shapes, in priority order:
//! - `# ...` at column 0: comment
//! - `- value`, `- key: value`, `- key:`, `- |`: list element
//! - `key:`: nested map
//! - `key: #N items`: nested list
//! - `key: |`: block of verbatim lines, decoded to text when it closes
//! - `key: value`: scalar

use super::tree::{DumpTree, Node, NodeId};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::trace;

/// Where an open frame is attached in its parent
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Root,
    Key(String),
    Index(usize),
}

/// An open container on the decoder stack
///
/// The frame at stack position `n` receives lines of depth `n`.
#[derive(Debug)]
struct Frame {
    node: NodeId,
    slot: Slot,
}

/// Decoder for `apk adbdump` style text
#[derive(Debug, Clone, Default)]
pub struct DumpDecoder {
    scope: Option<String>,
}

impl DumpDecoder {
    /// Decoder for the whole input
    pub fn new() -> Self {
        Self { scope: None }
    }

    /// Decoder that only collects the top-level section named `key`
    ///
    /// Other top-level sections are skipped without being parsed and
    /// decoding stops once the selected section closes.
    pub fn scoped(key: impl Into<String>) -> Self {
        Self {
            scope: Some(key.into()),
        }
    }

    /// Decode dump text into a tree
    ///
    /// Any structural mismatch fails the whole input; no partial tree is
    /// returned.
    pub fn decode(&self, input: &[u8]) -> Result<DumpTree> {
        self.decode_with(input, |_| {})
    }

    /// Decode, reporting each frame to `on_close` as it is finalized
    fn decode_with(&self, input: &[u8], mut on_close: impl FnMut(NodeId)) -> Result<DumpTree> {
        let mut tree = DumpTree::new();
        let mut stack = vec![Frame {
            node: tree.root(),
            slot: Slot::Root,
        }];

        let mut in_section = self.scope.is_none();
        let mut section_seen = false;

        for (index, raw) in input.split_inclusive(|b| *b == b'\n').enumerate() {
            let line_no = index + 1;

            if raw.first() == Some(&b'#') {
                continue;
            }

            let body = raw.trim_ascii_start();
            let content = body.trim_ascii_end();
            let indent = raw.len() - body.len();

            if content.is_empty() {
                // blank lines only matter inside a block
                if let Some(frame) = stack.last() {
                    if let Node::Block(buf) = tree.get_mut(frame.node) {
                        buf.push(b'\n');
                    }
                }
                continue;
            }

            let depth = indent.div_ceil(2);

            if let Some(scope) = &self.scope {
                if depth == 0 {
                    if section_key(content) == Some(scope.as_bytes()) {
                        in_section = true;
                        section_seen = true;
                    } else if section_seen {
                        break;
                    } else {
                        in_section = false;
                    }
                }
                if !in_section {
                    continue;
                }
            }

            while stack.len() - 1 > depth {
                if let Some(frame) = stack.pop() {
                    close_frame(&mut tree, frame, &mut on_close);
                }
            }

            let top = stack[stack.len() - 1].node;
            if let Node::Block(buf) = tree.get_mut(top) {
                // only the block's own indentation is stripped
                let strip = indent.min((stack.len() - 1) * 2);
                buf.extend_from_slice(&raw[strip..]);
                continue;
            }

            apply_line(&mut tree, &mut stack, content, line_no)?;
        }

        while stack.len() > 1 {
            if let Some(frame) = stack.pop() {
                close_frame(&mut tree, frame, &mut on_close);
            }
        }

        Ok(tree)
    }
}

/// Key of a top-level line, used for section matching
fn section_key(content: &[u8]) -> Option<&[u8]> {
    content
        .iter()
        .position(|b| *b == b':')
        .map(|colon| &content[..colon])
}

/// Finalize a frame popped off the stack
///
/// Blocks become scalars here, exactly once, since the frame is gone after.
fn close_frame(tree: &mut DumpTree, frame: Frame, on_close: &mut impl FnMut(NodeId)) {
    on_close(frame.node);
    let node = tree.get_mut(frame.node);
    if let Node::Block(bytes) = node {
        let text = String::from_utf8_lossy(&std::mem::take(bytes)).into_owned();
        *node = Node::Scalar(text);
        trace!(slot = ?frame.slot, "closed block");
    } else {
        trace!(slot = ?frame.slot, kind = node.kind(), "closed frame");
    }
}

fn open_child(
    tree: &mut DumpTree,
    stack: &mut Vec<Frame>,
    parent: NodeId,
    slot: Slot,
    node: Node,
) {
    let child = tree.alloc(node);
    match (tree.get_mut(parent), &slot) {
        (Node::Map(entries), Slot::Key(key)) => {
            entries.insert(key.clone(), child);
        }
        (Node::List(items), Slot::Index(_)) => items.push(child),
        _ => {}
    }
    stack.push(Frame { node: child, slot });
}

/// Interpret one non-block, non-comment line against the open frame
fn apply_line(
    tree: &mut DumpTree,
    stack: &mut Vec<Frame>,
    content: &[u8],
    line_no: usize,
) -> Result<()> {
    let mut top = stack[stack.len() - 1].node;
    let mut content = content;

    if let Some(rest) = content.strip_prefix(b"- ") {
        let index = match tree.get(top) {
            Node::List(items) => items.len(),
            other => {
                return Err(Error::malformed(
                    line_no,
                    format!("list item inside a {}", other.kind()),
                ));
            }
        };

        let opens_map = rest.ends_with(b":")
            || rest.windows(2).position(|w| w == b": ").is_some_and(|p| p > 0);

        if opens_map {
            open_child(tree, stack, top, Slot::Index(index), Node::Map(BTreeMap::new()));
            top = stack[stack.len() - 1].node;
            content = rest;
        } else if rest == b"|" {
            open_child(tree, stack, top, Slot::Index(index), Node::Block(Vec::new()));
            return Ok(());
        } else {
            let value = tree.alloc(Node::Scalar(String::from_utf8_lossy(rest).into_owned()));
            if let Node::List(items) = tree.get_mut(top) {
                items.push(value);
            }
            return Ok(());
        }
    }

    match tree.get(top) {
        Node::Map(_) => {}
        other => {
            return Err(Error::malformed(
                line_no,
                format!("key/value line inside a {}", other.kind()),
            ));
        }
    }

    let colon = content
        .iter()
        .position(|b| *b == b':')
        .ok_or_else(|| Error::malformed(line_no, "expected `key: value`"))?;

    let key = String::from_utf8_lossy(&content[..colon]).into_owned();
    let value = content[colon + 1..].trim_ascii_start();

    if value.is_empty() {
        open_child(tree, stack, top, Slot::Key(key), Node::Map(BTreeMap::new()));
    } else if value.starts_with(b"#") && value.ends_with(b"items") {
        open_child(tree, stack, top, Slot::Key(key), Node::List(Vec::new()));
    } else if value == b"|" {
        open_child(tree, stack, top, Slot::Key(key), Node::Block(Vec::new()));
    } else {
        let scalar = tree.alloc(Node::Scalar(String::from_utf8_lossy(value).into_owned()));
        if let Node::Map(entries) = tree.get_mut(top) {
            entries.insert(key, scalar);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::DumpValue;

    fn scalar(s: &str) -> DumpValue {
        DumpValue::Scalar(s.to_string())
    }

    fn map(entries: &[(&str, DumpValue)]) -> DumpValue {
        DumpValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    const INDEX: &str = "\
#%SCHEMA: 00000001
info:
  description: main repository
packages: # 2 items
  - name: musl
    version: 1.2.5-r0
    depends: # 1 items
      - so:libc.musl-x86_64.so.1
    provides: # 2 items
      - so:libc.musl-x86_64.so.1=1
      - cmd:ldd=1.2.5-r0
  - name: busybox
    version: 1.36.1-r2
    description: |
      Size optimized toolbox
        of many common UNIX utilities
";

    #[test]
    fn test_decode_index() {
        let tree = DumpDecoder::new().decode(INDEX.as_bytes()).unwrap();
        let value = tree.to_value(tree.root());

        let expected = map(&[
            ("info", map(&[("description", scalar("main repository"))])),
            (
                "packages",
                DumpValue::List(vec![
                    map(&[
                        ("name", scalar("musl")),
                        ("version", scalar("1.2.5-r0")),
                        (
                            "depends",
                            DumpValue::List(vec![scalar("so:libc.musl-x86_64.so.1")]),
                        ),
                        (
                            "provides",
                            DumpValue::List(vec![
                                scalar("so:libc.musl-x86_64.so.1=1"),
                                scalar("cmd:ldd=1.2.5-r0"),
                            ]),
                        ),
                    ]),
                    map(&[
                        ("name", scalar("busybox")),
                        ("version", scalar("1.36.1-r2")),
                        (
                            "description",
                            scalar("Size optimized toolbox\n  of many common UNIX utilities\n"),
                        ),
                    ]),
                ]),
            ),
        ]);

        assert_eq!(value, expected);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = DumpDecoder::new();
        let first = decoder.decode(INDEX.as_bytes()).unwrap();
        let second = decoder.decode(INDEX.as_bytes()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multi_level_dedent_closes_all_frames() {
        // `tail` closes the block, the list element, the list and `outer`
        // in one step.
        let input = "\
outer:
  items: #1 items
    - name: x
      notes: |
        first
          second
tail: done
";
        let mut closed = Vec::new();
        let tree = DumpDecoder::new()
            .decode_with(input.as_bytes(), |node| closed.push(node))
            .unwrap();

        for index in 0..tree.len() {
            assert!(
                !matches!(tree.get(NodeId(index)), Node::Block(_)),
                "block left undecoded"
            );
        }

        let outer = tree.path(&["outer"]).unwrap();
        let items = tree.path(&["outer", "items"]).unwrap();
        let element = tree.list_items(items)[0];
        let notes = tree.map_get(element, "notes").unwrap();
        // each frame finalized exactly once, innermost first
        assert_eq!(closed, vec![notes, element, items, outer]);

        assert_eq!(tree.scalar_at(element, "name"), Some("x"));
        assert_eq!(tree.scalar_at(element, "notes"), Some("first\n  second\n"));
        assert_eq!(tree.scalar_at(tree.root(), "tail"), Some("done"));
    }

    #[test]
    fn test_end_of_input_closes_open_frames_once() {
        let mut closed = Vec::new();
        let tree = DumpDecoder::new()
            .decode_with(b"a:
  b: |
    text
", |node| closed.push(node))
            .unwrap();

        let a = tree.path(&["a"]).unwrap();
        let b = tree.map_get(a, "b").unwrap();
        assert_eq!(closed, vec![b, a]);
        assert_eq!(tree.scalar(b), Some("text\n"));
    }

    #[test]
    fn test_block_line_indented_less_than_block() {
        // odd indentation still belongs to the block but keeps its content
        let tree = DumpDecoder::new().decode(b"key: |\n x\n   y\n").unwrap();
        assert_eq!(tree.scalar_at(tree.root(), "key"), Some("x\n y\n"));
    }

    #[test]
    fn test_block_as_list_element() {
        let input = "\
scripts: #2 items
  - |
    #!/bin/sh
    exit 0
  - plain
";
        let tree = DumpDecoder::new().decode(input.as_bytes()).unwrap();
        let list = tree.path(&["scripts"]).unwrap();
        let items = tree.list_items(list);
        assert_eq!(items.len(), 2);
        // a `#` inside a block is content, not a comment
        assert_eq!(tree.scalar(items[0]), Some("#!/bin/sh\nexit 0\n"));
        assert_eq!(tree.scalar(items[1]), Some("plain"));
    }

    #[test]
    fn test_block_closed_at_end_of_input() {
        let input = "description: |\n  line one\n\n  line two";
        let tree = DumpDecoder::new().decode(input.as_bytes()).unwrap();
        assert_eq!(
            tree.scalar_at(tree.root(), "description"),
            Some("line one\n\nline two")
        );
    }

    #[test]
    fn test_block_invalid_utf8_is_replaced() {
        let mut input = b"note: |\n  caf".to_vec();
        input.push(0xff);
        input.extend_from_slice(b"\nafter: 1\n");
        let tree = DumpDecoder::new().decode(&input).unwrap();
        assert_eq!(tree.scalar_at(tree.root(), "note"), Some("caf\u{fffd}\n"));
        assert_eq!(tree.scalar_at(tree.root(), "after"), Some("1"));
    }

    #[test]
    fn test_list_item_opens_nested_map() {
        let input = "\
paths: #2 items
  - name: usr/bin
    files: #2 items
      - name: ls
      - name: cat
  - files: #1 items
      - name: topfile
";
        let tree = DumpDecoder::new().decode(input.as_bytes()).unwrap();
        let paths = tree.path(&["paths"]).unwrap();
        let dirs = tree.list_items(paths);
        assert_eq!(dirs.len(), 2);
        assert_eq!(tree.scalar_at(dirs[0], "name"), Some("usr/bin"));
        let files = tree.map_get(dirs[0], "files").unwrap();
        assert_eq!(tree.list_items(files).len(), 2);
        let top_files = tree.map_get(dirs[1], "files").unwrap();
        assert_eq!(
            tree.scalar_at(tree.list_items(top_files)[0], "name"),
            Some("topfile")
        );
    }

    #[test]
    fn test_list_item_bare_key_opens_map() {
        let input = "\
entries: #1 items
  - acl:
      mode: 0755
";
        let tree = DumpDecoder::new().decode(input.as_bytes()).unwrap();
        let entries = tree.path(&["entries"]).unwrap();
        let element = tree.list_items(entries)[0];
        let acl = tree.map_get(element, "acl").unwrap();
        assert_eq!(tree.scalar_at(acl, "mode"), Some("0755"));
    }

    #[test]
    fn test_list_item_inside_map_fails() {
        let input = "info:\n  - stray\n";
        let err = DumpDecoder::new().decode(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedDump { line: 2, .. }));
    }

    #[test]
    fn test_key_inside_list_fails() {
        let input = "packages: #1 items\n  name: musl\n";
        let err = DumpDecoder::new().decode(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedDump { line: 2, .. }));
    }

    #[test]
    fn test_line_without_colon_fails() {
        let err = DumpDecoder::new()
            .decode(b"just some words\n")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDump { line: 1, .. }));
    }

    #[test]
    fn test_scoped_decode_skips_other_sections() {
        let input = "\
info:
  name: foo
  # not a comment at depth 1, but the section is skipped anyway
paths: #1 items
  - name: usr/bin
    files: #1 items
      - name: foo
scripts:
  post-install: |
    echo hi
";
        let tree = DumpDecoder::scoped("paths").decode(input.as_bytes()).unwrap();
        let keys: Vec<&str> = tree.map_keys(tree.root()).collect();
        assert_eq!(keys, vec!["paths"]);
        let paths = tree.path(&["paths"]).unwrap();
        assert_eq!(tree.list_items(paths).len(), 1);
    }

    #[test]
    fn test_scoped_decode_ignores_malformed_other_sections() {
        let input = "broken:\n  - not allowed here\npaths: #0 items\n";
        let tree = DumpDecoder::scoped("paths").decode(input.as_bytes()).unwrap();
        assert!(tree.path(&["paths"]).is_some());
    }

    #[test]
    fn test_scoped_decode_missing_section() {
        let tree = DumpDecoder::scoped("paths")
            .decode(b"info:\n  name: foo\n")
            .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_repeated_key_replaces_value() {
        let tree = DumpDecoder::new().decode(b"a: 1\na: 2\n").unwrap();
        assert_eq!(tree.scalar_at(tree.root(), "a"), Some("2"));
    }
}
