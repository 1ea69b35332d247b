//! Reconciles flat comment and answer listings into display order.
//!
//! The API returns replies as a flat list linked by `parentId`, with
//! soft-deleted records still present. [`reconcile`] produces the flat order
//! used by listing views; [`build_forest`] produces the nested form used by
//! threaded views. Neither ever fails: references that cannot be resolved
//! degrade to roots.

use std::{cmp::Reverse, collections::HashMap};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::record::{Record, RecordId};

/// How an entry appears in the reconciled listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// A live record without a resolvable parent.
    Root,
    /// A live record replying to another record in the listing.
    Reply,
    /// A soft-deleted root kept so its live replies stay attached.
    Placeholder,
}

/// One line of a reconciled listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadEntry<'a> {
    /// The record being shown.
    pub record: &'a Record,
    /// Whether the record is shown as a root, a reply or a placeholder.
    pub kind: EntryKind,
    /// Number of parent hops to the record's root, used for indentation.
    pub depth: usize,
}

/// The output of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciled<'a> {
    entries: Vec<ThreadEntry<'a>>,
    visible_root_count: usize,
    visible_reply_count: usize,
}

impl<'a> Reconciled<'a> {
    /// Entries in display order: live roots, live replies, then placeholders.
    #[must_use]
    pub fn entries(&self) -> &[ThreadEntry<'a>] {
        &self.entries
    }

    /// Number of live roots. Placeholders are not counted.
    #[must_use]
    pub const fn visible_root_count(&self) -> usize {
        self.visible_root_count
    }

    /// Number of live replies.
    #[must_use]
    pub const fn visible_reply_count(&self) -> usize {
        self.visible_reply_count
    }

    /// Total number of entries, placeholders included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, ThreadEntry<'a>> {
        self.entries.iter()
    }
}

impl<'r, 'a> IntoIterator for &'r Reconciled<'a> {
    type Item = &'r ThreadEntry<'a>;
    type IntoIter = std::slice::Iter<'r, ThreadEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A record together with its replies, as shown by threaded views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadNode<'a> {
    /// The record at this position of the thread.
    pub record: &'a Record,
    /// Set when the record is soft-deleted and only kept to anchor replies.
    pub placeholder: bool,
    /// Replies, in listing order.
    pub children: Vec<ThreadNode<'a>>,
}

impl ThreadNode<'_> {
    /// Number of live records in this subtree, including this one.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        usize::from(!self.placeholder)
            + self
                .children
                .iter()
                .map(ThreadNode::visible_count)
                .sum::<usize>()
    }
}

/// Reconciles a flat listing into display order.
///
/// Live roots come first, then live replies, then soft-deleted roots that
/// still have at least one live direct reply. Order within each group follows
/// the input. Deleted replies and deleted roots without live replies are
/// dropped.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn reconcile(records: &[Record]) -> Reconciled<'_> {
    let links = Links::resolve(records);
    let depths = links.depths();

    let mut roots = Vec::new();
    let mut replies = Vec::new();
    let mut placeholders = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let entry = |kind| ThreadEntry {
            record,
            kind,
            depth: depths[i],
        };

        match (record.is_deleted(), links.parents[i]) {
            (false, None) => roots.push(entry(EntryKind::Root)),
            (false, Some(_)) => replies.push(entry(EntryKind::Reply)),
            (true, None) if links.anchors_live_reply(records, i) => {
                placeholders.push(entry(EntryKind::Placeholder));
            }
            (true, _) => {}
        }
    }

    let visible_root_count = roots.len();
    let visible_reply_count = replies.len();
    debug!(
        roots = visible_root_count,
        replies = visible_reply_count,
        placeholders = placeholders.len(),
        "reconciled listing"
    );

    let mut entries = roots;
    entries.extend(replies);
    entries.extend(placeholders);

    Reconciled {
        entries,
        visible_root_count,
        visible_reply_count,
    }
}

/// Deepest nesting level of a [`ThreadNode`] tree.
///
/// Replies below this level are attached to their ancestor at this level, in
/// depth-first order, so arbitrarily long reply chains stay renderable.
pub const MAX_NESTING: usize = 32;

/// Builds the nested thread forest for a flat listing.
///
/// Roots appear in listing order, as do the children of every node. A
/// soft-deleted record survives as a placeholder only while its subtree still
/// contains a live record. Nodes never nest deeper than [`MAX_NESTING`].
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn build_forest(records: &[Record]) -> Vec<ThreadNode<'_>> {
    let links = Links::resolve(records);
    let depths = links.depths();
    let kept = links.kept(records, &depths);

    // deepest first, so every child is built before its parent
    let mut order: Vec<usize> = (0..records.len()).filter(|&i| kept[i]).collect();
    order.sort_by_key(|&i| Reverse(depths[i]));

    let mut built: Vec<Option<ThreadNode<'_>>> = vec![None; records.len()];
    for i in order {
        if depths[i] > MAX_NESTING {
            continue;
        }

        let children = if depths[i] == MAX_NESTING {
            links.flattened(records, &kept, i)
        } else {
            links.children[i]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect()
        };

        built[i] = Some(ThreadNode {
            record: &records[i],
            placeholder: records[i].is_deleted(),
            children,
        });
    }

    let forest: Vec<ThreadNode<'_>> = (0..records.len())
        .filter(|&i| links.parents[i].is_none())
        .filter_map(|i| built[i].take())
        .collect();
    debug!(roots = forest.len(), "built thread forest");
    forest
}

/// Parent links of one listing, resolved to positions in the input.
///
/// Dangling references and references that take part in a cycle are dropped,
/// so the remaining links always form a forest.
struct Links {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl Links {
    fn resolve(records: &[Record]) -> Self {
        let mut index: HashMap<&RecordId, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(&record.id).or_insert(i);
        }

        // edges point from child to parent
        let mut graph = DiGraphMap::<usize, ()>::with_capacity(records.len(), records.len());
        let mut parents = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            graph.add_node(i);
            let parent = record.parent_id.as_ref().and_then(|parent_id| {
                let found = index.get(parent_id).copied();
                if found.is_none() {
                    debug!(id = %record.id, parent = %parent_id, "dangling parent reference");
                }
                found
            });
            if let Some(parent) = parent {
                graph.add_edge(i, parent, ());
            }
            parents.push(parent);
        }

        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node));
            if !cyclic {
                continue;
            }

            let ids: Vec<&str> = component.iter().map(|&n| records[n].id.as_str()).collect();
            warn!(?ids, "parent references form a cycle, treating records as roots");
            for node in component {
                parents[node] = None;
            }
        }

        let mut children = vec![Vec::new(); records.len()];
        for (child, parent) in parents.iter().enumerate() {
            if let Some(parent) = *parent {
                children[parent].push(child);
            }
        }

        Self { parents, children }
    }

    fn anchors_live_reply(&self, records: &[Record], i: usize) -> bool {
        self.children[i]
            .iter()
            .any(|&child| !records[child].is_deleted())
    }

    /// Depth of every record, walking each parent chain once.
    fn depths(&self) -> Vec<usize> {
        let mut depths: Vec<Option<usize>> = vec![None; self.parents.len()];
        let mut chain = Vec::new();

        for start in 0..self.parents.len() {
            let mut current = start;
            let mut depth = loop {
                if let Some(known) = depths[current] {
                    break known;
                }
                match self.parents[current] {
                    Some(parent) => {
                        chain.push(current);
                        current = parent;
                    }
                    None => {
                        depths[current] = Some(0);
                        break 0;
                    }
                }
            };

            while let Some(node) = chain.pop() {
                depth += 1;
                depths[node] = Some(depth);
            }
        }

        depths.into_iter().map(Option::unwrap_or_default).collect()
    }

    /// Marks the records that appear in the forest: live records and the
    /// deleted ancestors that anchor them.
    fn kept(&self, records: &[Record], depths: &[usize]) -> Vec<bool> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&i| Reverse(depths[i]));

        let mut kept = vec![false; records.len()];
        for i in order {
            kept[i] |= !records[i].is_deleted();
            if let (true, Some(parent)) = (kept[i], self.parents[i]) {
                kept[parent] = true;
            }
        }
        kept
    }

    /// The kept descendants of `i` as leaves, in depth-first listing order.
    fn flattened<'a>(
        &self,
        records: &'a [Record],
        kept: &[bool],
        i: usize,
    ) -> Vec<ThreadNode<'a>> {
        let mut leaves = Vec::new();
        let mut stack: Vec<usize> = self.children[i].iter().rev().copied().collect();

        while let Some(node) = stack.pop() {
            // an unkept node has no kept descendants
            if !kept[node] {
                continue;
            }
            leaves.push(ThreadNode {
                record: &records[node],
                placeholder: records[node].is_deleted(),
                children: Vec::new(),
            });
            stack.extend(self.children[node].iter().rev());
        }
        leaves
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn ids(reconciled: &Reconciled) -> Vec<String> {
        reconciled
            .iter()
            .map(|entry| entry.record.id.to_string())
            .collect()
    }

    #[test]
    fn empty_listing_reconciles_to_nothing() {
        let reconciled = reconcile(&[]);
        assert!(reconciled.is_empty());
        assert_eq!(reconciled.visible_root_count(), 0);
        assert_eq!(reconciled.visible_reply_count(), 0);
    }

    #[test]
    fn deleted_root_with_live_reply_is_shown_last() {
        let records = [Record::new(1).soft_deleted(), Record::new(2).with_parent(1)];

        let reconciled = reconcile(&records);

        assert_eq!(ids(&reconciled), ["2", "1"]);
        assert_eq!(reconciled.entries()[1].kind, EntryKind::Placeholder);
        assert_eq!(reconciled.visible_root_count(), 0);
        assert_eq!(reconciled.visible_reply_count(), 1);
    }

    #[test]
    fn deleted_root_without_live_replies_is_dropped() {
        let records = [
            Record::new(1).soft_deleted(),
            Record::new(2).with_parent(1).soft_deleted(),
            Record::new(3).soft_deleted(),
        ];

        assert!(reconcile(&records).is_empty());
    }

    #[test]
    fn groups_keep_input_order() {
        let records = [
            Record::new(10).with_parent(1),
            Record::new(1),
            Record::new(11).with_parent(2),
            Record::new(2),
            Record::new(3).soft_deleted(),
            Record::new(12).with_parent(3),
        ];

        let reconciled = reconcile(&records);

        assert_eq!(ids(&reconciled), ["1", "2", "10", "11", "12", "3"]);
        assert_eq!(reconciled.visible_root_count(), 2);
        assert_eq!(reconciled.visible_reply_count(), 3);
    }

    #[test]
    fn dangling_parent_becomes_root() {
        let records = [Record::new(5).with_parent(404)];

        let reconciled = reconcile(&records);

        assert_eq!(reconciled.entries()[0].kind, EntryKind::Root);
        assert_eq!(reconciled.entries()[0].depth, 0);
        assert_eq!(reconciled.visible_root_count(), 1);
        assert_eq!(reconciled.visible_reply_count(), 0);
    }

    #[test]
    fn deleted_record_with_dangling_parent_can_anchor_replies() {
        let records = [
            Record::new(1).with_parent(404).soft_deleted(),
            Record::new(2).with_parent(1),
        ];

        let reconciled = reconcile(&records);

        assert_eq!(ids(&reconciled), ["2", "1"]);
        assert_eq!(reconciled.entries()[1].kind, EntryKind::Placeholder);
    }

    #[test]
    fn placeholder_appears_once_with_many_replies() {
        let records = [
            Record::new(1).soft_deleted(),
            Record::new(2).with_parent(1),
            Record::new(3).with_parent(1),
        ];

        let reconciled = reconcile(&records);
        let placeholders = reconciled
            .iter()
            .filter(|entry| entry.kind == EntryKind::Placeholder)
            .count();

        assert_eq!(placeholders, 1);
    }

    #[test]
    fn nested_replies_carry_depth() {
        let records = [
            Record::new(1),
            Record::new(2).with_parent(1),
            Record::new(3).with_parent(2),
        ];

        let reconciled = reconcile(&records);
        let depths: Vec<usize> = reconciled.iter().map(|entry| entry.depth).collect();

        assert_eq!(depths, [0, 1, 2]);
        assert_eq!(reconciled.visible_reply_count(), 2);
    }

    #[test]
    fn parent_cycle_degrades_to_roots() {
        let records = [
            Record::new(1).with_parent(2),
            Record::new(2).with_parent(1),
            Record::new(3).with_parent(3),
            Record::new(4).with_parent(1),
        ];

        let reconciled = reconcile(&records);

        assert_eq!(ids(&reconciled), ["1", "2", "3", "4"]);
        assert_eq!(reconciled.visible_root_count(), 3);
        assert_eq!(reconciled.visible_reply_count(), 1);
        assert_eq!(reconciled.entries()[3].depth, 1);
    }

    #[test]
    fn mixed_deletion_signals_are_all_honoured() {
        let mut by_timestamp = Record::new(2).with_parent(1);
        by_timestamp.deleted_at = Some("2024-01-15T10:00:00".to_string());
        let mut by_status = Record::new(3).with_parent(1);
        by_status.status = Some("DELETED".to_string());

        let records = [Record::new(1), by_timestamp, by_status];

        assert_eq!(ids(&reconcile(&records)), ["1"]);
    }

    /// Deterministic pseudo-random listings, including dangling references,
    /// cycles, deletions and duplicate parents.
    fn generated_listings() -> impl Iterator<Item = Vec<Record>> {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed % bound
        };

        (0..200).map(move |_| {
            let len = next(12);
            (0..len)
                .map(|id| {
                    let mut record = Record::new(i64::try_from(id).unwrap());
                    if next(3) > 0 {
                        // occasionally point past the end of the listing
                        let parent = next(len + 2);
                        record = record.with_parent(i64::try_from(parent).unwrap());
                    }
                    if next(4) == 0 {
                        record = record.soft_deleted();
                    }
                    record
                })
                .collect()
        })
    }

    #[test]
    fn output_is_a_subset_of_input() {
        for records in generated_listings() {
            let reconciled = reconcile(&records);
            let input: HashSet<&RecordId> = records.iter().map(|r| &r.id).collect();

            assert!(reconciled.len() <= records.len());
            assert!(reconciled.iter().all(|entry| input.contains(&entry.record.id)));
        }
    }

    #[test]
    fn counts_cover_every_live_record() {
        for records in generated_listings() {
            let reconciled = reconcile(&records);
            let live = records.iter().filter(|r| !r.is_deleted()).count();

            assert_eq!(
                reconciled.visible_root_count() + reconciled.visible_reply_count(),
                live
            );
        }
    }

    #[test]
    fn forest_nests_replies_under_parents() {
        let records = [
            Record::new(1),
            Record::new(2).with_parent(1),
            Record::new(3).with_parent(2),
            Record::new(4),
        ];

        let forest = build_forest(&records);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children[0].record.id, RecordId::from(3));
        assert_eq!(forest[0].visible_count(), 3);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn forest_prunes_dead_subtrees_and_keeps_anchors() {
        let records = [
            Record::new(1).soft_deleted(),
            Record::new(2).with_parent(1).soft_deleted(),
            Record::new(3).with_parent(2),
            Record::new(4).soft_deleted(),
            Record::new(5).with_parent(4).soft_deleted(),
        ];

        let forest = build_forest(&records);

        assert_eq!(forest.len(), 1);
        assert!(forest[0].placeholder);
        assert!(forest[0].children[0].placeholder);
        assert_eq!(forest[0].children[0].children[0].record.id, RecordId::from(3));
        assert_eq!(forest[0].visible_count(), 1);
    }

    fn nesting(forest: &[ThreadNode]) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&ThreadNode, usize)> = forest.iter().map(|node| (node, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    fn chain(len: i64) -> Vec<Record> {
        (0..len)
            .map(|i| {
                let record = Record::new(i);
                if i == 0 { record } else { record.with_parent(i - 1) }
            })
            .collect()
    }

    #[test]
    fn very_deep_chain_is_flattened_below_max_nesting() {
        let records = chain(50_000);

        let reconciled = reconcile(&records);
        assert_eq!(reconciled.len(), 50_000);
        assert_eq!(reconciled.entries().last().unwrap().depth, 49_999);

        let forest = build_forest(&records);
        assert_eq!(forest.len(), 1);
        assert_eq!(nesting(&forest), MAX_NESTING + 1);
        assert_eq!(forest[0].visible_count(), 50_000);

        let json = serde_json::to_string(&forest).unwrap();
        assert!(json.contains("\"49999\""));
    }

    #[test]
    fn flattened_replies_keep_depth_first_order() {
        let mut records = chain(i64::try_from(MAX_NESTING).unwrap() + 1);
        let anchor = i64::try_from(MAX_NESTING).unwrap();
        records.extend([
            Record::new(100).with_parent(anchor),
            Record::new(101).with_parent(100).soft_deleted(),
            Record::new(102).with_parent(101),
            Record::new(103).with_parent(anchor),
            Record::new(104).with_parent(anchor).soft_deleted(),
        ]);

        let forest = build_forest(&records);
        let mut node = &forest[0];
        while let Some(child) = node.children.first().filter(|_| node.children.len() == 1) {
            node = child;
        }

        assert_eq!(node.record.id, RecordId::from(anchor));
        let flattened: Vec<&str> = node.children.iter().map(|n| n.record.id.as_str()).collect();
        assert_eq!(flattened, ["100", "101", "102", "103"]);
        assert!(node.children[1].placeholder);
        assert!(node.children.iter().all(|n| n.children.is_empty()));
    }
}
