//! Checkable directory tree for picking source files.
//!
//! The tree is built in one synchronous, depth-first pass over the filesystem.
//! Two independent filters shape it: an extension allow-list for files, and a
//! "non-empty folders only" rule that drops directories without any qualifying
//! file below them. Directories that cannot be listed get a single
//! [`NodeKind::Inaccessible`] child instead of failing the build.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default allow-list used when the extension filter is on.
pub const SOURCE_EXTENSIONS: [&str; 4] = [".c", ".cpp", ".h", ".hpp"];

/// Display text of an inaccessible directory's placeholder child.
pub const ACCESS_DENIED_LABEL: &str = "Access denied";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
    /// Stands in for the contents of a directory that could not be listed
    Inaccessible,
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    checked: bool,
}

impl TreeNode {
    /// Base name; the root carries the root path as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text shown to the user.
    pub fn label(&self) -> &str {
        match self.kind {
            NodeKind::Inaccessible => ACCESS_DENIED_LABEL,
            _ => &self.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }
}

/// Filter flags applied while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Keep only files whose extension is in `extensions`
    pub use_extensions: bool,
    /// Skip directories without a qualifying file anywhere below
    pub only_non_empty_folders: bool,
    /// Dot-inclusive, case-sensitive extensions
    pub extensions: Vec<String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            use_extensions: false,
            only_non_empty_folders: false,
            extensions: SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TreeOptions {
    /// Whether a file with this name passes the extension filter.
    /// An extension that is not valid UTF-8 never matches.
    pub fn accepts_file(&self, file_name: impl AsRef<Path>) -> bool {
        if !self.use_extensions {
            return true;
        }
        match file_name.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self
                .extensions
                .iter()
                .any(|allowed| allowed.strip_prefix('.') == Some(ext)),
            None => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Folder {0:?} does not exist or is not a directory")]
    RootNotFound(PathBuf),

    #[error("No folder has been opened yet")]
    NoRoot,
}

/// Arena-backed tree. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
}

impl FileTree {
    fn with_root(name: String) -> Self {
        Self {
            nodes: vec![TreeNode {
                name,
                kind: NodeKind::Directory,
                parent: None,
                children: Vec::new(),
                checked: false,
            }],
        }
    }

    fn push(&mut self, parent: NodeId, name: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            checked: false,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether anything was listed below the root.
    pub fn has_entries(&self) -> bool {
        self.nodes.len() > 1
    }

    /// Child names of a node, in display order.
    pub fn child_names(&self, id: NodeId) -> Vec<&str> {
        self.node(id)
            .map(|n| {
                n.children
                    .iter()
                    .map(|c| self.nodes[c.0].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Node ids in depth-first pre-order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Look up a node by its `/`-separated path relative to the root.
    pub fn find(&self, relative: &str) -> Option<NodeId> {
        let mut current = self.root();
        for part in relative.split('/').filter(|p| !p.is_empty()) {
            current = *self.nodes[current.0]
                .children
                .iter()
                .find(|c| self.nodes[c.0].name == part)?;
        }
        Some(current)
    }

    /// Full path of a node: names from the root down, joined with `/`.
    pub fn resolve_path(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();

        let (root, rest) = names.split_first()?;
        if rest.is_empty() {
            return Some(root.to_string());
        }
        let mut path = root.trim_end_matches('/').to_string();
        for name in rest {
            path.push('/');
            path.push_str(name);
        }
        Some(path)
    }

    /// Mark a single node. Returns `false` for an unknown id.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.checked = checked;
                true
            }
            None => false,
        }
    }

    /// Flip a node's check state with the same cascade as [`check_recursive`].
    /// Returns `false` for an unknown id or a placeholder.
    ///
    /// [`check_recursive`]: FileTree::check_recursive
    pub fn toggle_checked(&mut self, id: NodeId) -> bool {
        let checked = match self.node(id) {
            Some(node) if node.kind != NodeKind::Inaccessible => !node.checked,
            _ => return false,
        };
        self.check_recursive(id, checked);
        true
    }

    /// Mark a node and its whole subtree, then re-derive its ancestors:
    /// a directory is checked iff all of its children are.
    /// Placeholders cannot be checked, so they leave the tree untouched.
    pub fn check_recursive(&mut self, id: NodeId, checked: bool) {
        match self.node(id) {
            Some(node) if node.kind != NodeKind::Inaccessible => {}
            _ => return,
        }

        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let node = &mut self.nodes[cur.0];
            if node.kind != NodeKind::Inaccessible {
                node.checked = checked;
            }
            stack.extend(node.children.iter().copied());
        }

        let mut parent = self.nodes[id.0].parent;
        while let Some(p) = parent {
            let all_checked = self.nodes[p.0]
                .children
                .iter()
                .map(|c| &self.nodes[c.0])
                .filter(|n| n.kind != NodeKind::Inaccessible)
                .all(|n| n.checked);
            self.nodes[p.0].checked = all_checked;
            parent = self.nodes[p.0].parent;
        }
    }

    /// Paths of every checked node in depth-first order. Placeholders are never included.
    pub fn collect_checked_paths(&self) -> Vec<String> {
        self.collect_checked(|node| node.kind != NodeKind::Inaccessible)
    }

    /// Paths of checked files only; what gets attached to a prompt.
    pub fn collect_checked_files(&self) -> Vec<String> {
        self.collect_checked(|node| node.kind == NodeKind::File)
    }

    fn collect_checked(&self, keep: impl Fn(&TreeNode) -> bool) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter(|id| {
                let node = &self.nodes[id.0];
                node.checked && keep(node)
            })
            .filter_map(|id| self.resolve_path(id))
            .collect()
    }

    /// Indented text listing with check boxes, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id.0];
            let mark = match node.kind {
                NodeKind::Inaccessible => "   ",
                _ if node.checked => "[x]",
                _ => "[ ]",
            };
            let suffix = if node.is_directory() && id != self.root() {
                "/"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "{}{} {}{}",
                "  ".repeat(depth),
                mark,
                node.label(),
                suffix
            );
            stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }
}

/// Builds and owns the current tree; remembers the root for redraws.
#[derive(Debug, Clone, Default)]
pub struct FileTreeBuilder {
    options: TreeOptions,
    root: Option<PathBuf>,
    tree: Option<FileTree>,
}

impl FileTreeBuilder {
    pub fn new(options: TreeOptions) -> Self {
        Self {
            options,
            root: None,
            tree: None,
        }
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn tree(&self) -> Option<&FileTree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut FileTree> {
        self.tree.as_mut()
    }

    /// Replace the current tree with a fresh listing of `root`.
    pub fn build(&mut self, root: impl AsRef<Path>) -> Result<&FileTree, TreeError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(TreeError::RootNotFound(root.to_path_buf()));
        }

        let mut tree = FileTree::with_root(root.to_string_lossy().into_owned());
        let top = tree.root();
        fill_tree(&mut tree, root, top, &self.options);
        debug!("Built tree for {:?}: {} nodes", root, tree.node_count());

        self.root = Some(root.to_path_buf());
        Ok(&*self.tree.insert(tree))
    }

    /// Rebuild from the recorded root. Check state is discarded.
    pub fn redraw(&mut self) -> Result<&FileTree, TreeError> {
        let root = self.root.clone().ok_or(TreeError::NoRoot)?;
        self.build(root)
    }

    /// Change the filters and redraw if a folder is open.
    pub fn set_options(&mut self, options: TreeOptions) -> Result<(), TreeError> {
        self.options = options;
        if self.root.is_some() {
            self.redraw()?;
        }
        Ok(())
    }

    pub fn set_use_extensions(&mut self, enabled: bool) -> Result<(), TreeError> {
        let options = TreeOptions {
            use_extensions: enabled,
            ..self.options.clone()
        };
        self.set_options(options)
    }

    pub fn set_only_non_empty_folders(&mut self, enabled: bool) -> Result<(), TreeError> {
        let options = TreeOptions {
            only_non_empty_folders: enabled,
            ..self.options.clone()
        };
        self.set_options(options)
    }

    pub fn resolve_path(&self, id: NodeId) -> Option<String> {
        self.tree.as_ref()?.resolve_path(id)
    }

    pub fn collect_checked_paths(&self) -> Vec<String> {
        self.tree
            .as_ref()
            .map(|t| t.collect_checked_paths())
            .unwrap_or_default()
    }
}

/// A directory entry under its on-disk name, which may not be valid UTF-8.
struct Listed {
    name: OsString,
    is_dir: bool,
}

fn list_dir(path: &Path) -> io::Result<Vec<Listed>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        entries.push(Listed {
            name: entry.file_name(),
            is_dir: entry.path().is_dir(),
        });
    }
    Ok(entries)
}

fn fill_tree(tree: &mut FileTree, path: &Path, node: NodeId, options: &TreeOptions) {
    let mut entries = match list_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!("Access denied to {:?}", path);
            tree.push(node, ACCESS_DENIED_LABEL.to_string(), NodeKind::Inaccessible);
            return;
        }
        Err(e) => {
            warn!("Failed to list {:?}: {}", path, e);
            return;
        }
    };

    // Directories first, then files; each group by name
    entries.sort_by(|a, b| (!a.is_dir, &a.name).cmp(&(!b.is_dir, &b.name)));

    for entry in entries {
        let entry_path = path.join(&entry.name);
        let display = entry.name.to_string_lossy().into_owned();
        if entry.is_dir {
            if options.only_non_empty_folders && !has_qualifying_file(&entry_path, options) {
                continue;
            }
            let child = tree.push(node, display, NodeKind::Directory);
            fill_tree(tree, &entry_path, child, options);
        } else if options.accepts_file(&entry.name) {
            tree.push(node, display, NodeKind::File);
        }
    }
}

/// Check for the non-empty filter: is there any qualifying file
/// anywhere below `dir`? Nested directories are not filtered here, so one deep
/// file keeps its whole ancestor chain visible.
fn has_qualifying_file(dir: &Path, options: &TreeOptions) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => {
            if entries.next().is_none() {
                return false;
            }
        }
        Err(e) => {
            debug!("Skipping {:?}: {}", dir, e);
            return false;
        }
    }

    for entry in WalkDir::new(dir).min_depth(1) {
        // Unreadable nested folders are passed over; the rest of the subtree still counts.
        let Ok(entry) = entry else { continue };
        let is_dir = entry.file_type().is_dir()
            || (entry.path_is_symlink() && entry.path().is_dir());
        if !is_dir && options.accepts_file(entry.file_name()) {
            return true;
        }
    }
    false
}
