//! In-process directory/content service.
//!
//! Implements the same operations and status conventions as the networked
//! service, against a tree held in memory. Names and content arrive in
//! their transport encoding and are decoded here, as the real service does.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde_json::json;
use tracing::trace;

use super::{op, RemoteCall, Reply, TransportError};
use crate::name;
use crate::types::{Inode, NodeKind, MAX_CONTENT, MAX_NAME_LEN, ROOT_INODE};

/// Status codes returned by the service.
pub mod status {
    pub const OK: i64 = 0;
    pub const NO_ENTRY: i64 = 1;
    pub const NOT_A_FILE: i64 = 2;
    pub const NOT_A_DIRECTORY: i64 = 3;
    pub const ENTRY_EXISTS: i64 = 5;
    pub const FILE_TOO_BIG: i64 = 6;
    pub const DIRECTORY_NOT_EMPTY: i64 = 8;
    pub const NAME_TOO_LONG: i64 = 9;
    pub const BAD_REQUEST: i64 = 10;
    pub const INVALID_TOKEN: i64 = 11;
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    content: Vec<u8>,
    children: Vec<(Vec<u8>, Inode)>,
    links: usize,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            content: Vec::new(),
            children: Vec::new(),
            links: 1,
        }
    }

    fn child(&self, name: &[u8]) -> Option<Inode> {
        self.children
            .iter()
            .find(|(n, _)| n.as_slice() == name)
            .map(|(_, ino)| *ino)
    }
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<Inode, Node>,
    next_inode: Inode,
}

/// Parsed request parameters.
struct Params<'a> {
    values: HashMap<&'a str, &'a str>,
}

impl<'a> Params<'a> {
    fn new(params: &'a [(&'a str, String)]) -> Self {
        Self {
            values: params.iter().map(|(k, v)| (*k, v.as_str())).collect(),
        }
    }

    fn inode(&self, key: &str) -> Result<Inode, i64> {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .ok_or(status::BAD_REQUEST)
    }

    fn decoded(&self, key: &str) -> Result<Vec<u8>, i64> {
        self.values
            .get(key)
            .and_then(|v| name::decode(v))
            .ok_or(status::BAD_REQUEST)
    }

    fn name(&self) -> Result<Vec<u8>, i64> {
        let name = self.decoded("name")?;
        if name.is_empty() || name == b"." || name == b".." || name.contains(&b'/') {
            return Err(status::BAD_REQUEST);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(status::NAME_TOO_LONG);
        }
        Ok(name)
    }
}

/// In-memory service holding a single tree shared by all tokens.
pub struct MemoryRemote {
    tree: Mutex<Tree>,
    tokens: Option<HashSet<String>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Service with an empty root directory that accepts any token.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_INODE, Node::new(NodeKind::Directory));
        Self {
            tree: Mutex::new(Tree {
                nodes,
                next_inode: ROOT_INODE + 1,
            }),
            tokens: None,
        }
    }

    /// Accept only the given token; others get [`status::INVALID_TOKEN`].
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tokens
            .get_or_insert_with(HashSet::new)
            .insert(token.into());
        self
    }

    /// Number of live objects, root included.
    pub fn node_count(&self) -> usize {
        self.tree.lock().nodes.len()
    }

    fn dispatch(&self, operation: &str, params: &Params<'_>) -> Result<serde_json::Value, i64> {
        let mut tree = self.tree.lock();
        match operation {
            op::LIST => tree.list(params.inode("inode")?),
            op::LOOKUP => tree.lookup(params.inode("parent")?, &params.name()?),
            op::CREATE => {
                let kind = match params.values.get("type").copied() {
                    Some("file") => NodeKind::File,
                    Some("directory") => NodeKind::Directory,
                    _ => return Err(status::BAD_REQUEST),
                };
                tree.create(params.inode("parent")?, params.name()?, kind)
            }
            op::UNLINK => tree.remove(params.inode("parent")?, &params.name()?, NodeKind::File),
            op::RMDIR => tree.remove(
                params.inode("parent")?,
                &params.name()?,
                NodeKind::Directory,
            ),
            op::LINK => tree.link(
                params.inode("source")?,
                params.inode("parent")?,
                params.name()?,
            ),
            op::READ => tree.read(params.inode("inode")?),
            op::WRITE => tree.write(params.inode("inode")?, params.decoded("content")?),
            _ => Err(status::BAD_REQUEST),
        }
    }
}

impl Tree {
    fn node(&self, ino: Inode) -> Result<&Node, i64> {
        self.nodes.get(&ino).ok_or(status::NO_ENTRY)
    }

    fn dir(&self, ino: Inode) -> Result<&Node, i64> {
        let node = self.node(ino)?;
        match node.kind {
            NodeKind::Directory => Ok(node),
            NodeKind::File => Err(status::NOT_A_DIRECTORY),
        }
    }

    fn file_mut(&mut self, ino: Inode) -> Result<&mut Node, i64> {
        let node = self.nodes.get_mut(&ino).ok_or(status::NO_ENTRY)?;
        match node.kind {
            NodeKind::File => Ok(node),
            NodeKind::Directory => Err(status::NOT_A_FILE),
        }
    }

    fn list(&self, ino: Inode) -> Result<serde_json::Value, i64> {
        let dir = self.dir(ino)?;
        let entries: Vec<_> = dir
            .children
            .iter()
            .map(|(name, child)| {
                let kind = self.nodes[child].kind;
                json!({
                    "entry_type": kind.code(),
                    "ino": child,
                    "name": String::from_utf8_lossy(name),
                })
            })
            .collect();
        Ok(json!({"entries_count": entries.len(), "entries": entries}))
    }

    fn lookup(&self, parent: Inode, name: &[u8]) -> Result<serde_json::Value, i64> {
        let child = self.dir(parent)?.child(name).ok_or(status::NO_ENTRY)?;
        let kind = self.nodes[&child].kind;
        Ok(json!({"entry_type": kind.code(), "ino": child}))
    }

    fn create(
        &mut self,
        parent: Inode,
        name: Vec<u8>,
        kind: NodeKind,
    ) -> Result<serde_json::Value, i64> {
        if self.dir(parent)?.child(&name).is_some() {
            return Err(status::ENTRY_EXISTS);
        }
        let ino = self.next_inode;
        self.next_inode += 1;
        self.nodes.insert(ino, Node::new(kind));
        self.attach(parent, name, ino);
        Ok(json!(ino))
    }

    fn attach(&mut self, parent: Inode, name: Vec<u8>, ino: Inode) {
        if let Some(dir) = self.nodes.get_mut(&parent) {
            dir.children.push((name, ino));
        }
    }

    fn remove(
        &mut self,
        parent: Inode,
        name: &[u8],
        expected: NodeKind,
    ) -> Result<serde_json::Value, i64> {
        let child = self.dir(parent)?.child(name).ok_or(status::NO_ENTRY)?;
        let node = self.node(child)?;
        match (expected, node.kind) {
            (NodeKind::File, NodeKind::Directory) => return Err(status::NOT_A_FILE),
            (NodeKind::Directory, NodeKind::File) => return Err(status::NOT_A_DIRECTORY),
            (NodeKind::Directory, NodeKind::Directory) if !node.children.is_empty() => {
                return Err(status::DIRECTORY_NOT_EMPTY)
            }
            _ => {}
        }

        if let Some(dir) = self.nodes.get_mut(&parent) {
            dir.children.retain(|(n, _)| n.as_slice() != name);
        }
        let orphaned = match self.nodes.get_mut(&child) {
            Some(node) => {
                node.links -= 1;
                node.links == 0
            }
            None => false,
        };
        if orphaned {
            self.nodes.remove(&child);
        }
        Ok(serde_json::Value::Null)
    }

    fn link(
        &mut self,
        source: Inode,
        parent: Inode,
        name: Vec<u8>,
    ) -> Result<serde_json::Value, i64> {
        if self.dir(parent)?.child(&name).is_some() {
            return Err(status::ENTRY_EXISTS);
        }
        self.file_mut(source)?.links += 1;
        self.attach(parent, name, source);
        Ok(serde_json::Value::Null)
    }

    fn read(&mut self, ino: Inode) -> Result<serde_json::Value, i64> {
        let file = self.file_mut(ino)?;
        Ok(json!({"content_length": file.content.len(), "content": file.content}))
    }

    fn write(&mut self, ino: Inode, content: Vec<u8>) -> Result<serde_json::Value, i64> {
        if content.len() > MAX_CONTENT {
            return Err(status::FILE_TOO_BIG);
        }
        self.file_mut(ino)?.content = content;
        Ok(serde_json::Value::Null)
    }
}

impl RemoteCall for MemoryRemote {
    fn invoke(
        &self,
        token: &str,
        operation: &str,
        params: &[(&str, String)],
    ) -> Result<Reply, TransportError> {
        if let Some(tokens) = &self.tokens {
            if !tokens.contains(token) {
                return Ok(Reply::status(status::INVALID_TOKEN));
            }
        }

        let reply = match self.dispatch(operation, &Params::new(params)) {
            Ok(payload) => Reply::ok(payload),
            Err(code) => Reply::status(code),
        };
        trace!(operation, status = reply.status, "Memory remote handled call");
        Ok(reply)
    }
}
