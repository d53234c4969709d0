use perspective_engine::{
    run_pass, ContentTree, DocumentNode, EngineConfig, EngineState, MemoryTree, NodePath,
};
use perspective_test_utils::{
    assert_no_nested_owners, fresh_state, item_config, life_config, nested_price_page, owners,
    product_listing, time_config,
};
use pretty_assertions::assert_eq;

#[test]
fn nested_price_is_annotated_once_on_the_child() {
    let (mut tree, div, span) = nested_price_page();
    let mut state = fresh_state();
    let report = run_pass(&mut tree, &mut state, &EngineConfig::new());

    assert_eq!(report.injected, 1);
    assert_eq!(owners(&tree), vec![span]);
    assert!(tree.marker_children(div).is_empty());
    assert_eq!(
        state.annotated().keys().cloned().collect::<Vec<_>>(),
        vec![NodePath::new(vec![0, 0])]
    );
}

#[test]
fn product_listing_gets_one_annotation_per_card() {
    let mut tree = product_listing(&[
        ("Headphones", "₹2,999"),
        ("Kettle", "Rs. 1,499"),
        ("Charger", "799 rupees"),
    ]);
    let mut state = EngineState::new(time_config());
    let report = run_pass(&mut tree, &mut state, &EngineConfig::new());

    assert_eq!(report.injected, 3);
    assert_no_nested_owners(&tree);
    let amounts: Vec<f64> = report.tokens.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![2999.0, 1499.0, 799.0]);
}

#[test]
fn rendering_in_each_mode() {
    let build = || {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        tree.append_text_element(root, "span", "₹1,500").unwrap();
        tree
    };

    let mut tree = build();
    let mut state = EngineState::new(item_config("Coffee", 150.0));
    run_pass(&mut tree, &mut state, &EngineConfig::new());
    assert_eq!(tree.rendered_text(tree.root()), "₹1,500☕ 10 Coffees");

    let mut tree = build();
    let mut state = EngineState::new(time_config());
    run_pass(&mut tree, &mut state, &EngineConfig::new());
    assert_eq!(tree.rendered_text(tree.root()), "₹1,500⏰ 2.3 hrs");

    let mut tree = build();
    let mut state = EngineState::new(life_config());
    run_pass(&mut tree, &mut state, &EngineConfig::new());
    assert!(tree.rendered_text(tree.root()).starts_with("₹1,500📊 "));
}

#[test]
fn scripts_and_styles_are_never_annotated() {
    let document: DocumentNode = serde_json::from_str(
        r#"{"tag": "body", "children": [
            {"tag": "script", "children": [{"text": "var price = '₹999';"}]},
            {"tag": "style", "children": [{"text": ".price::after { content: '₹1' }"}]},
            {"tag": "p", "children": [{"text": "Total ₹250"}]}
        ]}"#,
    )
    .unwrap();
    let mut tree = MemoryTree::from_document(&document);
    let report = run_pass(&mut tree, &mut fresh_state(), &EngineConfig::new());

    assert_eq!(report.injected, 1);
    assert_eq!(report.tokens[0].source_path, NodePath::new(vec![2]));
}

#[test]
fn content_added_inside_an_owner_is_subsumed() {
    let mut tree = MemoryTree::new("body");
    let root = tree.root();
    let price = tree.append_element(root, "p").unwrap();
    tree.append_text(price, "₹640").unwrap();
    let mut state = fresh_state();
    let config = EngineConfig::new();
    run_pass(&mut tree, &mut state, &config);

    // The host later repeats the amount in a struck-through child
    let struck = tree.insert_element(price, 0, "s").unwrap();
    tree.append_text(struck, "₹640").unwrap();
    let report = run_pass(&mut tree, &mut state, &config);
    assert_eq!(report.injected, 0);
    assert_eq!(report.subsumed, 1);
    assert_eq!(tree.markers().len(), 1);
}

#[test]
fn annotated_document_round_trips_through_json() {
    let (mut tree, _, _) = nested_price_page();
    run_pass(&mut tree, &mut fresh_state(), &EngineConfig::new());

    let json = serde_json::to_string(&tree.to_document()).unwrap();
    let reloaded = MemoryTree::from_document(&serde_json::from_str(&json).unwrap());
    assert_eq!(reloaded.outline(), tree.outline());

    // A reloaded page already carries its markers; a new engine adopts them
    let mut reloaded = reloaded;
    let mut state = fresh_state();
    let report = run_pass(&mut reloaded, &mut state, &EngineConfig::new());
    assert_eq!(report.injected, 0);
    assert_eq!(report.stale_removed, 0);
    assert_eq!(state.annotation_count(), 1);
}

#[test]
fn demo_product_page() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/product_page.json");
    let content = std::fs::read_to_string(path).unwrap();
    let document: DocumentNode = serde_json::from_str(&content).unwrap();
    let mut tree = MemoryTree::from_document(&document);

    let report = run_pass(&mut tree, &mut fresh_state(), &EngineConfig::new());
    let raw: Vec<&str> = report.tokens.iter().map(|t| t.raw.as_str()).collect();
    assert_eq!(
        raw,
        vec!["₹2,999", "Rs. 1,999", "1,499 rupees", "INR 500", "₹499"]
    );
    assert_no_nested_owners(&tree);
}
