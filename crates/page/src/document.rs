//! Retained page document
//!
//! Arena-backed snapshot of the host DOM, parsed from HTML. Nodes carry a
//! synthetic vertical layout so scrolling, viewport math and relevance
//! ranking are deterministic without a rendering engine. Structural and
//! text mutations are published on a broadcast channel; mutations under the
//! SDK's own shell root are flagged so the content cache can ignore them.

use blitsum_core::NodeId;
use parking_lot::RwLock;
use scraper::Html;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Tags that never render content
const NON_RENDERED_TAGS: &[&str] = &[
    "script", "style", "head", "meta", "link", "noscript", "template", "title",
];

/// Synthetic bounding box; horizontal extent is the viewport width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
    pub width: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.height * self.width
    }

    /// Vertical midpoint
    pub fn mid(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Scroll viewport over the document
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub scroll_y: f64,
    pub height: f64,
    pub width: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_y: 0.0,
            height: 800.0,
            width: 1280.0,
        }
    }
}

impl Viewport {
    pub fn top(&self) -> f64 {
        self.scroll_y
    }

    pub fn bottom(&self) -> f64 {
        self.scroll_y + self.height
    }

    pub fn mid(&self) -> f64 {
        self.scroll_y + self.height / 2.0
    }

    pub fn fully_contains(&self, rect: &Rect) -> bool {
        rect.top >= self.top() && rect.bottom() <= self.bottom()
    }

    pub fn intersects(&self, rect: &Rect) -> bool {
        rect.bottom() > self.top() && rect.top < self.bottom()
    }
}

/// What changed in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added, removed or replaced
    ChildList,
    /// Text content changed; carries the new text length
    CharacterData { text_len: usize },
}

/// A published document mutation
#[derive(Debug, Clone, Copy)]
pub struct MutationEvent {
    pub kind: MutationKind,
    /// True when the mutation happened under the SDK shell root
    pub in_sdk_shell: bool,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    attrs: HashMap<String, String>,
    /// Direct text content of this element (not descendants)
    own_text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    inline_style: HashMap<String, String>,
    rect: Rect,
    in_sdk_shell: bool,
}

struct DocumentInner {
    url: String,
    title: String,
    nodes: Vec<Node>,
    root: Option<NodeId>,
    viewport: Viewport,
    sdk_root: Option<NodeId>,
    generation: u64,
    click_log: Vec<NodeId>,
}

/// The retained page document
pub struct PageDocument {
    inner: RwLock<DocumentInner>,
    mutations: broadcast::Sender<MutationEvent>,
}

impl PageDocument {
    /// Parse host HTML into a fresh document
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        let (mutations, _) = broadcast::channel(64);
        let doc = Self {
            inner: RwLock::new(DocumentInner {
                url: url.into(),
                title: String::new(),
                nodes: Vec::new(),
                root: None,
                viewport: Viewport::default(),
                sdk_root: None,
                generation: 0,
                click_log: Vec::new(),
            }),
            mutations,
        };
        doc.parse_into(html);
        doc
    }

    fn parse_into(&self, html: &str) {
        let parsed = Html::parse_document(html);
        let mut inner = self.inner.write();
        inner.nodes.clear();
        inner.root = None;
        inner.sdk_root = None;
        inner.title.clear();

        let root_ref = parsed.tree.root();
        let root = Self::build_subtree(&mut inner.nodes, root_ref, None);
        inner.root = root;

        // title from the first <title> element
        let title = inner
            .nodes
            .iter()
            .find(|n| n.tag == "title")
            .map(|n| n.own_text.trim().to_string());
        if let Some(title) = title {
            inner.title = title;
        }

        Self::layout_inner(&mut inner);
    }

    fn build_subtree(
        arena: &mut Vec<Node>,
        node_ref: ego_tree::NodeRef<'_, scraper::Node>,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        match node_ref.value() {
            scraper::Node::Document | scraper::Node::Fragment => {
                // transparent containers: wrap in a synthetic root element
                let id = NodeId(arena.len() as u32);
                arena.push(Node {
                    tag: "#root".to_string(),
                    dom_id: None,
                    classes: Vec::new(),
                    attrs: HashMap::new(),
                    own_text: String::new(),
                    children: Vec::new(),
                    parent,
                    inline_style: HashMap::new(),
                    rect: Rect {
                        top: 0.0,
                        height: 0.0,
                        width: 0.0,
                    },
                    in_sdk_shell: false,
                });
                for child in node_ref.children() {
                    if let Some(child_id) = Self::build_subtree(arena, child, Some(id)) {
                        arena[id.0 as usize].children.push(child_id);
                    }
                }
                Some(id)
            }
            scraper::Node::Element(element) => {
                let id = NodeId(arena.len() as u32);
                let mut attrs = HashMap::new();
                for (name, value) in element.attrs() {
                    attrs.insert(name.to_string(), value.to_string());
                }
                let inline_style = attrs
                    .get("style")
                    .map(|s| parse_style_attr(s))
                    .unwrap_or_default();

                arena.push(Node {
                    tag: element.name().to_string(),
                    dom_id: attrs.get("id").cloned(),
                    classes: element.classes().map(|c| c.to_string()).collect(),
                    attrs,
                    own_text: String::new(),
                    children: Vec::new(),
                    parent,
                    inline_style,
                    rect: Rect {
                        top: 0.0,
                        height: 0.0,
                        width: 0.0,
                    },
                    in_sdk_shell: false,
                });

                for child in node_ref.children() {
                    match child.value() {
                        scraper::Node::Text(text) => {
                            let trimmed = text.trim();
                            if !trimmed.is_empty() {
                                let node = &mut arena[id.0 as usize];
                                if !node.own_text.is_empty() {
                                    node.own_text.push(' ');
                                }
                                node.own_text.push_str(trimmed);
                            }
                        }
                        _ => {
                            if let Some(child_id) = Self::build_subtree(arena, child, Some(id)) {
                                arena[id.0 as usize].children.push(child_id);
                            }
                        }
                    }
                }
                Some(id)
            }
            _ => None,
        }
    }

    /// Recompute the synthetic layout. Hidden subtrees get zero extent;
    /// leaves get a height proportional to their text, containers span
    /// their children.
    fn layout_inner(inner: &mut DocumentInner) {
        let width = inner.viewport.width;
        fn walk(nodes: &mut Vec<Node>, id: NodeId, cursor: f64, width: f64) -> f64 {
            let (tag, own_len, children, hidden) = {
                let n = &nodes[id.0 as usize];
                (
                    n.tag.clone(),
                    n.own_text.len(),
                    n.children.clone(),
                    node_is_style_hidden(n) || NON_RENDERED_TAGS.contains(&n.tag.as_str()),
                )
            };
            if hidden {
                nodes[id.0 as usize].rect = Rect {
                    top: cursor,
                    height: 0.0,
                    width: 0.0,
                };
                return 0.0;
            }
            let top = cursor;
            let mut y = cursor;
            if own_len > 0 {
                y += 28.0 + (own_len as f64 / 60.0).floor() * 20.0;
            }
            for child in &children {
                y += walk(nodes, *child, y, width);
            }
            let mut height = y - top;
            if height == 0.0 && tag != "#root" {
                height = 24.0;
            }
            nodes[id.0 as usize].rect = Rect { top, height, width };
            height
        }
        if let Some(root) = inner.root {
            walk(&mut inner.nodes, root, 0.0, width);
        }
    }

    // --- mutation API -------------------------------------------------------

    /// Replace the whole document content, as a host SPA would.
    /// Invalidates every outstanding `NodeId`.
    pub fn replace_html(&self, html: &str) {
        self.parse_into(html);
        self.inner.write().generation += 1;
        let _ = self.mutations.send(MutationEvent {
            kind: MutationKind::ChildList,
            in_sdk_shell: false,
        });
    }

    /// Replace the direct text of a node
    pub fn set_text(&self, id: NodeId, text: &str) {
        let in_shell = {
            let mut inner = self.inner.write();
            let Some(node) = inner.nodes.get_mut(id.0 as usize) else {
                return;
            };
            node.own_text = text.to_string();
            let in_shell = node.in_sdk_shell;
            Self::layout_inner(&mut inner);
            in_shell
        };
        let _ = self.mutations.send(MutationEvent {
            kind: MutationKind::CharacterData {
                text_len: text.len(),
            },
            in_sdk_shell: in_shell,
        });
    }

    /// Append the SDK shell root to the document and flag its subtree.
    /// The shell is invisible to extraction and its mutations never flush
    /// the content cache.
    pub fn mount_sdk_root(&self) -> NodeId {
        let mut inner = self.inner.write();
        let id = NodeId(inner.nodes.len() as u32);
        let parent = inner.root;
        inner.nodes.push(Node {
            tag: "div".to_string(),
            dom_id: Some("blitsum-root".to_string()),
            classes: vec!["blitsum-shell".to_string()],
            attrs: HashMap::new(),
            own_text: String::new(),
            children: Vec::new(),
            parent,
            inline_style: HashMap::new(),
            rect: Rect {
                top: 0.0,
                height: 0.0,
                width: 0.0,
            },
            in_sdk_shell: true,
        });
        if let Some(parent) = parent {
            inner.nodes[parent.0 as usize].children.push(id);
        }
        inner.sdk_root = Some(id);
        id
    }

    /// Append a text bubble under the SDK shell (used by the runtime shell).
    /// Emits a shell-flagged mutation, which the cache ignores.
    pub fn append_shell_text(&self, text: &str) -> Option<NodeId> {
        let shell = self.inner.read().sdk_root?;
        let id = {
            let mut inner = self.inner.write();
            let id = NodeId(inner.nodes.len() as u32);
            inner.nodes.push(Node {
                tag: "div".to_string(),
                dom_id: None,
                classes: vec!["blitsum-bubble".to_string()],
                attrs: HashMap::new(),
                own_text: text.to_string(),
                children: Vec::new(),
                parent: Some(shell),
                inline_style: HashMap::new(),
                rect: Rect {
                    top: 0.0,
                    height: 0.0,
                    width: 0.0,
                },
                in_sdk_shell: true,
            });
            inner.nodes[shell.0 as usize].children.push(id);
            id
        };
        let _ = self.mutations.send(MutationEvent {
            kind: MutationKind::ChildList,
            in_sdk_shell: true,
        });
        Some(id)
    }

    pub fn subscribe_mutations(&self) -> broadcast::Receiver<MutationEvent> {
        self.mutations.subscribe()
    }

    // --- reads --------------------------------------------------------------

    pub fn url(&self) -> String {
        self.inner.read().url.clone()
    }

    pub fn title(&self) -> String {
        self.inner.read().title.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.read().viewport
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        {
            let mut inner = self.inner.write();
            inner.viewport.width = width;
            inner.viewport.height = height;
            Self::layout_inner(&mut inner);
        }
    }

    pub fn scroll_y(&self) -> f64 {
        self.inner.read().viewport.scroll_y
    }

    /// Total document height
    pub fn doc_height(&self) -> f64 {
        let inner = self.inner.read();
        inner
            .root
            .map(|r| inner.nodes[r.0 as usize].rect.height)
            .unwrap_or(0.0)
    }

    /// Scroll position as a fraction of the scrollable range
    pub fn scroll_fraction(&self) -> f64 {
        let inner = self.inner.read();
        let doc_height = inner
            .root
            .map(|r| inner.nodes[r.0 as usize].rect.height)
            .unwrap_or(0.0);
        let range = (doc_height - inner.viewport.height).max(1.0);
        (inner.viewport.scroll_y / range).clamp(0.0, 1.0)
    }

    pub fn set_scroll(&self, y: f64) {
        let mut inner = self.inner.write();
        let doc_height = inner
            .root
            .map(|r| inner.nodes[r.0 as usize].rect.height)
            .unwrap_or(0.0);
        let max = (doc_height - inner.viewport.height).max(0.0);
        inner.viewport.scroll_y = y.clamp(0.0, max);
    }

    /// Scroll so the node's center sits at the viewport center.
    /// Returns whether the node ended up visible.
    pub fn scroll_into_view(&self, id: NodeId, center: bool) -> bool {
        let rect = match self.rect(id) {
            Some(r) => r,
            None => return false,
        };
        let target = if center {
            rect.mid() - self.viewport().height / 2.0
        } else {
            rect.top
        };
        self.set_scroll(target);
        let vp = self.viewport();
        vp.intersects(&rect)
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.inner.read().nodes.get(id.0 as usize).map(|n| n.rect)
    }

    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.inner.read().nodes.get(id.0 as usize).map(|n| n.tag.clone())
    }

    pub fn dom_id(&self, id: NodeId) -> Option<String> {
        self.inner.read().nodes.get(id.0 as usize)?.dom_id.clone()
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.inner.read().nodes.get(id.0 as usize)?.attrs.get(name).cloned()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.read().nodes.get(id.0 as usize)?.parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Direct text of the node itself
    pub fn own_text(&self, id: NodeId) -> String {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)
            .map(|n| n.own_text.clone())
            .unwrap_or_default()
    }

    /// Concatenated text of the node's subtree, whitespace-collapsed
    pub fn text_content(&self, id: NodeId) -> String {
        let inner = self.inner.read();
        let mut out = String::new();
        fn collect(nodes: &[Node], id: NodeId, out: &mut String) {
            let Some(node) = nodes.get(id.0 as usize) else {
                return;
            };
            if NON_RENDERED_TAGS.contains(&node.tag.as_str()) {
                return;
            }
            if !node.own_text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&node.own_text);
            }
            for child in &node.children {
                collect(nodes, *child, out);
            }
        }
        collect(&inner.nodes, id, &mut out);
        blitsum_core::text::clean_whitespace(&out)
    }

    /// Whether the node renders: not a script/style, not style-hidden, and
    /// no hidden ancestor
    pub fn is_visible(&self, id: NodeId) -> bool {
        let inner = self.inner.read();
        let mut current = Some(id);
        while let Some(cid) = current {
            let Some(node) = inner.nodes.get(cid.0 as usize) else {
                return false;
            };
            if NON_RENDERED_TAGS.contains(&node.tag.as_str()) || node_is_style_hidden(node) {
                return false;
            }
            current = node.parent;
        }
        true
    }

    pub fn in_sdk_shell(&self, id: NodeId) -> bool {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)
            .map(|n| n.in_sdk_shell)
            .unwrap_or(false)
    }

    /// All visible element ids in document order, excluding the SDK shell
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        fn walk(nodes: &[Node], id: NodeId, out: &mut Vec<NodeId>) {
            let Some(node) = nodes.get(id.0 as usize) else {
                return;
            };
            if node.in_sdk_shell
                || NON_RENDERED_TAGS.contains(&node.tag.as_str())
                || node_is_style_hidden(node)
            {
                return;
            }
            if node.tag != "#root" {
                out.push(id);
            }
            for child in &node.children {
                walk(nodes, *child, out);
            }
        }
        if let Some(root) = inner.root {
            walk(&inner.nodes, root, &mut out);
        }
        out
    }

    /// All descendants of a node in document order, excluding the node
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        fn walk(nodes: &[Node], id: NodeId, out: &mut Vec<NodeId>) {
            let Some(node) = nodes.get(id.0 as usize) else {
                return;
            };
            for child in &node.children {
                out.push(*child);
                walk(nodes, *child, out);
            }
        }
        walk(&inner.nodes, id, &mut out);
        out
    }

    /// Every node with the given tag, including non-rendered ones.
    /// Used for metadata extraction (`meta`, JSON-LD `script` blocks).
    pub fn nodes_with_tag(&self, tag: &str) -> Vec<NodeId> {
        let inner = self.inner.read();
        inner
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.tag == tag)
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    // --- inline styles ------------------------------------------------------

    /// Snapshot of the node's inline styles, for restore-after-effect
    pub fn inline_styles(&self, id: NodeId) -> HashMap<String, String> {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)
            .map(|n| n.inline_style.clone())
            .unwrap_or_default()
    }

    pub fn set_inline_style(&self, id: NodeId, prop: &str, value: &str) {
        let mut inner = self.inner.write();
        if let Some(node) = inner.nodes.get_mut(id.0 as usize) {
            node.inline_style.insert(prop.to_string(), value.to_string());
        }
    }

    pub fn inline_style(&self, id: NodeId, prop: &str) -> Option<String> {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)?
            .inline_style
            .get(prop)
            .cloned()
    }

    /// Replace the node's inline styles wholesale with a prior snapshot
    pub fn restore_inline_styles(&self, id: NodeId, snapshot: HashMap<String, String>) {
        let mut inner = self.inner.write();
        if let Some(node) = inner.nodes.get_mut(id.0 as usize) {
            node.inline_style = snapshot;
        }
    }

    pub fn add_class(&self, id: NodeId, class: &str) {
        let mut inner = self.inner.write();
        if let Some(node) = inner.nodes.get_mut(id.0 as usize) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&self, id: NodeId, class: &str) {
        let mut inner = self.inner.write();
        if let Some(node) = inner.nodes.get_mut(id.0 as usize) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.inner
            .read()
            .nodes
            .get(id.0 as usize)
            .map(|n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    // --- interaction --------------------------------------------------------

    /// Record a click on a node, as the host browser would dispatch it
    pub fn click(&self, id: NodeId) {
        self.inner.write().click_log.push(id);
    }

    pub fn click_log(&self) -> Vec<NodeId> {
        self.inner.read().click_log.clone()
    }

    /// Fast 32-bit FNV-1a hash over the visible content
    pub fn content_hash(&self) -> u32 {
        let inner = self.inner.read();
        let mut hash: u32 = 0x811c9dc5;
        let mut feed = |bytes: &[u8]| {
            for b in bytes {
                hash ^= *b as u32;
                hash = hash.wrapping_mul(0x0100_0193);
            }
        };
        fn walk(nodes: &[Node], id: NodeId, feed: &mut impl FnMut(&[u8])) {
            let Some(node) = nodes.get(id.0 as usize) else {
                return;
            };
            if node.in_sdk_shell || NON_RENDERED_TAGS.contains(&node.tag.as_str()) {
                return;
            }
            feed(node.tag.as_bytes());
            feed(node.own_text.as_bytes());
            for child in &node.children {
                walk(nodes, *child, feed);
            }
        }
        if let Some(root) = inner.root {
            walk(&inner.nodes, root, &mut feed);
        }
        hash
    }
}

fn parse_style_attr(style: &str) -> HashMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_lowercase();
            let value = value.trim().to_string();
            if prop.is_empty() || value.is_empty() {
                None
            } else {
                Some((prop, value))
            }
        })
        .collect()
}

fn node_is_style_hidden(node: &Node) -> bool {
    let style = &node.inline_style;
    if style.get("display").map(|v| v == "none").unwrap_or(false) {
        return true;
    }
    if style
        .get("visibility")
        .map(|v| v == "hidden")
        .unwrap_or(false)
    {
        return true;
    }
    if let Some(opacity) = style.get("opacity") {
        if opacity.parse::<f64>().map(|o| o == 0.0).unwrap_or(false) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><head><title>Acme</title></head><body>
        <section id="hero"><h1>Acme Platform</h1><p>Ship faster.</p></section>
        <section id="pricing"><h2>Pricing</h2>
          <div class="card"><h4>Starter</h4><div class="price">$49/mo</div></div>
          <div class="card" style="display:none"><h4>Hidden</h4></div>
        </section>
        </body></html>
    "#;

    #[test]
    fn test_parse_basics() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        assert_eq!(doc.title(), "Acme");
        assert!(!doc.visible_nodes().is_empty());
    }

    #[test]
    fn test_hidden_nodes_excluded() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        let hidden = doc
            .visible_nodes()
            .into_iter()
            .find(|id| doc.text_content(*id).contains("Hidden"));
        assert!(hidden.is_none());
    }

    #[test]
    fn test_text_content() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        let pricing = doc
            .visible_nodes()
            .into_iter()
            .find(|id| doc.dom_id(*id).as_deref() == Some("pricing"))
            .unwrap();
        let text = doc.text_content(pricing);
        assert!(text.contains("Starter"));
        assert!(text.contains("$49/mo"));
    }

    #[test]
    fn test_scroll_into_view_centers() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        let pricing = doc
            .visible_nodes()
            .into_iter()
            .find(|id| doc.dom_id(*id).as_deref() == Some("pricing"))
            .unwrap();
        assert!(doc.scroll_into_view(pricing, true));
        let vp = doc.viewport();
        let rect = doc.rect(pricing).unwrap();
        assert!(vp.intersects(&rect));
    }

    #[test]
    fn test_mutation_events() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        let mut rx = doc.subscribe_mutations();
        doc.replace_html("<html><body><main>new</main></body></html>");
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, MutationKind::ChildList);
        assert!(!event.in_sdk_shell);
        assert_eq!(doc.generation(), 1);
    }

    #[test]
    fn test_shell_mutations_flagged() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        doc.mount_sdk_root();
        let mut rx = doc.subscribe_mutations();
        doc.append_shell_text("hello from the assistant");
        let event = rx.try_recv().unwrap();
        assert!(event.in_sdk_shell);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        let before = doc.content_hash();
        doc.replace_html("<html><body><main>different</main></body></html>");
        assert_ne!(before, doc.content_hash());
    }

    #[test]
    fn test_inline_style_snapshot_restore() {
        let doc = PageDocument::from_html("https://acme.dev", SAMPLE);
        let node = doc.visible_nodes()[0];
        let snapshot = doc.inline_styles(node);
        doc.set_inline_style(node, "box-shadow", "0 0 20px gold");
        assert!(doc.inline_style(node, "box-shadow").is_some());
        doc.restore_inline_styles(node, snapshot);
        assert!(doc.inline_style(node, "box-shadow").is_none());
    }

    #[test]
    fn test_style_attr_parsed() {
        let doc = PageDocument::from_html(
            "https://acme.dev",
            r#"<html><body><div style="opacity: 0">ghost</div><p>real</p></body></html>"#,
        );
        let ghost = doc
            .visible_nodes()
            .into_iter()
            .find(|id| doc.text_content(*id).contains("ghost"));
        assert!(ghost.is_none());
    }
}
