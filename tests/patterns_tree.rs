//! Pattern-alias tree: duplicate merge, cascade removal and sort caching.

use rextree::rextree::models::patterns::{
    CheckState, PatternColumn, PatternTreeModel, PatternValue,
};
use rextree::rextree::tree::{NodeId, SortOrder};

fn find(model: &PatternTreeModel, alias: &str) -> Option<NodeId> {
    let keys: Vec<PatternValue> = alias
        .split('_')
        .map(|s| PatternValue::Str(s.to_string()))
        .collect();
    model.tree().search(model.tree().root(), &keys)
}

fn top_level_aliases(model: &PatternTreeModel) -> Vec<String> {
    let root = model.tree().root();
    model
        .tree()
        .sorted_children(root)
        .iter()
        .map(|id| {
            model
                .tree()
                .data(*id, PatternColumn::AliasTreeLevel.index())
                .map(|c| c.str().to_string())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_identical_key_paths_never_create_siblings() {
    let mut model = PatternTreeModel::new();
    model.add_pattern("App_Startup", "init.*", CheckState::Unchecked, CheckState::Unchecked);
    model.add_pattern("App_Startup", "boot.*", CheckState::Unchecked, CheckState::Checked);

    let app = find(&model, "App").unwrap();
    assert_eq!(model.tree().child_count(app), 1);

    let leaf = find(&model, "App_Startup").unwrap();
    assert_eq!(
        model
            .tree()
            .data(leaf, PatternColumn::Regex.index())
            .map(|c| c.str().to_string()),
        Some("boot.*".to_string())
    );
    assert_eq!(
        model
            .tree()
            .data(leaf, PatternColumn::Default.index())
            .map(PatternValue::check),
        Some(CheckState::Checked)
    );
}

#[test]
fn test_sort_is_stable_and_cache_stays_clean() {
    let mut model = PatternTreeModel::new();
    for alias in ["delta", "Alpha", "charlie", "bravo"] {
        model.add_pattern(alias, "x", CheckState::Unchecked, CheckState::Unchecked);
    }

    model.sort(PatternColumn::AliasTreeLevel, SortOrder::Ascending);
    let first_order = top_level_aliases(&model);
    assert_eq!(first_order, vec!["Alpha", "bravo", "charlie", "delta"]);
    assert!(model.tree().is_whole_sorted(model.tree().root()));

    // a second sort with the same key changes nothing and keeps the cache
    model.sort(PatternColumn::AliasTreeLevel, SortOrder::Ascending);
    assert_eq!(top_level_aliases(&model), first_order);
    assert!(model.tree().is_whole_sorted(model.tree().root()));
}

#[test]
fn test_cascade_removal_stops_at_populated_ancestor() {
    let mut model = PatternTreeModel::new();
    let deep = model
        .add_pattern("Sys_Net_TCP_Retransmit", "retrans", CheckState::Unchecked, CheckState::Unchecked)
        .unwrap();
    model.add_pattern("Sys_Net_UDP", "udp", CheckState::Unchecked, CheckState::Unchecked);

    assert!(model.remove_pattern(deep));
    assert!(find(&model, "Sys_Net_TCP").is_none());
    // Net keeps living because UDP is still under it
    let net = find(&model, "Sys_Net").unwrap();
    assert_eq!(model.tree().child_count(net), 1);
}

#[test]
fn test_roll_up_spans_placeholder_levels() {
    let mut model = PatternTreeModel::new();
    let leaf = model
        .add_pattern("Top_Mid_Leaf", "x", CheckState::Unchecked, CheckState::Checked)
        .unwrap();
    // the only leaf is checked, so every level above reports checked
    for alias in ["Top_Mid", "Top"] {
        let node = find(&model, alias).unwrap();
        assert_eq!(
            model
                .tree()
                .data(node, PatternColumn::Default.index())
                .map(PatternValue::check),
            Some(CheckState::Checked),
            "level {} should roll up",
            alias
        );
    }

    model.set_default(leaf, CheckState::Unchecked);
    let top = find(&model, "Top").unwrap();
    assert_eq!(
        model
            .tree()
            .data(top, PatternColumn::Default.index())
            .map(PatternValue::check),
        Some(CheckState::Unchecked)
    );
}
