//! End-to-end stitching scenarios.

use quilt_core::{make, Node, NodePath, Scalar, Tree};
use quilt_stitch::{
    report, stitch, Incoming, Patches, Report, StitchConfig, StitchError, Stitcher,
};
use quilt_wire::{write, WriteOptions};
use serde_json::{json, Value};

fn json_of(tree: &Tree) -> Value {
    tree.stripped().to_json().unwrap()
}

fn written(tree: &Tree) -> String {
    write(tree, &WriteOptions::default())
        .unwrap()
        .to_text()
        .unwrap()
}

#[test]
fn post_attached_to_profile() {
    let profile: Tree = make(json!({ "name": "Joe", "posts": [] }), None).unwrap();
    let posts = profile.subtree(&NodePath::parse("posts")).unwrap();
    let post = make(json!({ "title": "A new post" }), Some(&posts)).unwrap();

    let data: Tree = stitch([&profile, &post]).unwrap();
    assert_eq!(
        json_of(&data),
        json!({ "name": "Joe", "posts": [{ "title": "A new post" }] })
    );
}

#[test]
fn two_versions_of_the_same_root() {
    let a: Tree = make(json!({ "surname": "Joe" }), None).unwrap();
    let mut b: Tree = make(&a, None).unwrap();
    b.set(&NodePath::parse("name"), json!("Don")).unwrap();

    let data: Tree = stitch([&a, &b]).unwrap();
    assert_eq!(json_of(&data), json!({ "surname": "Joe", "name": "Don" }));

    let data: Tree = stitch([&b, &a]).unwrap();
    assert_eq!(json_of(&data), json!({ "surname": "Joe", "name": "Don" }));
}

#[test]
fn written_versions_of_the_same_root() {
    let a: Tree = make(json!({ "surname": "Joe" }), None).unwrap();
    let mut b: Tree = make(&a, None).unwrap();
    b.set(&NodePath::parse("name"), json!("Don")).unwrap();

    let data: Tree = stitch([written(&a), written(&b)]).unwrap();
    assert_eq!(json_of(&data), json!({ "surname": "Joe", "name": "Don" }));
}

#[test]
fn item_attached_to_root_list() {
    let list: Tree = make(json!([]), None).unwrap();
    let mut item = make(json!({}), Some(&list)).unwrap();
    item.set(&NodePath::parse("name"), json!("Joe")).unwrap();

    let data: Tree = stitch([&list, &item]).unwrap();
    assert_eq!(json_of(&data), json!([{ "name": "Joe" }]));
}

#[test]
fn items_in_reverse_arrival_order() {
    let list: Tree = make(json!([]), None).unwrap();
    let items: Vec<Tree> = (1..=3)
        .map(|i| make(json!({ "n": i }), Some(&list)).unwrap())
        .collect();

    let mut patches: Vec<&Tree> = items.iter().rev().collect();
    patches.push(&list);

    let data: Tree = stitch(patches).unwrap();
    assert_eq!(json_of(&data), json!([{ "n": 1 }, { "n": 2 }, { "n": 3 }]));
}

#[test]
fn sub_property_patch_updates_parent() {
    let parent: Tree = make(json!({ "profile": {} }), None).unwrap();
    let mut profile: Tree = make(
        parent.subtree(&NodePath::parse("profile")).unwrap(),
        None,
    )
    .unwrap();
    profile.set(&NodePath::parse("name"), json!("Don")).unwrap();

    let data: Tree = stitch([&parent, &profile]).unwrap();
    assert_eq!(json_of(&data), json!({ "profile": { "name": "Don" } }));
}

#[test]
fn edited_sub_object_of_list_item() {
    let list: Tree = make(json!([]), None).unwrap();
    let item = make(json!({ "more": { "anything": true } }), Some(&list)).unwrap();
    let mut more: Tree = make(item.subtree(&NodePath::parse("more")).unwrap(), None).unwrap();
    more.set(&NodePath::parse("name"), json!("Don")).unwrap();

    let data: Tree = stitch([
        Incoming::from(&list),
        Incoming::from(written(&item)),
        Incoming::from(written(&more)),
    ])
    .unwrap();
    assert_eq!(
        json_of(&data),
        json!([{ "more": { "anything": true, "name": "Don" } }])
    );
}

#[test]
fn nested_attachments_arrive_before_their_parents() {
    let root: Tree = make(json!({ "products": [] }), None).unwrap();
    let products = root.subtree(&NodePath::parse("products")).unwrap();
    let product = make(json!({ "name": "lamp", "reviews": [] }), Some(&products)).unwrap();
    let reviews = product.subtree(&NodePath::parse("reviews")).unwrap();
    let review = make(json!({ "comment": "bright" }), Some(&reviews)).unwrap();

    let data: Tree = stitch([&review, &product, &root]).unwrap();
    assert_eq!(
        json_of(&data),
        json!({ "products": [{ "name": "lamp", "reviews": [{ "comment": "bright" }] }] })
    );
}

#[test]
fn untracked_overlays_merge_at_root() {
    let state: Tree = make(json!({ "work": { "name": "super" }, "matches": [], "urls": [] }), None)
        .unwrap();
    let matches = state.subtree(&NodePath::parse("matches")).unwrap();
    let mut found = make(json!({ "name": "" }), Some(&matches)).unwrap();
    found.set(&NodePath::parse("name"), json!("match")).unwrap();

    let urls = Tree::from(json!({ "urls": ["https://example.com"] }));
    let flag = Tree::from(json!({ "test": true }));

    let data: Tree = stitch([&state, &found, &urls, &flag]).unwrap();
    assert_eq!(
        json_of(&data),
        json!({
            "work": { "name": "super" },
            "matches": [{ "name": "match" }],
            "urls": ["https://example.com"],
            "test": true
        })
    );
}

#[test]
fn patch_attached_to_a_map_is_counted_but_not_placed() {
    let root: Tree = make(json!({ "profile": { "name": "Joe" } }), None).unwrap();
    let profile = root.subtree(&NodePath::parse("profile")).unwrap();
    let note = make(json!({ "text": "hello" }), Some(&profile)).unwrap();

    let outcome: Report = report([&note, &root]).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.stitched_count, 2);

    let data = outcome.data.unwrap();
    assert_eq!(json_of(&data), json!({ "profile": { "name": "Joe" } }));
    assert_eq!(data.contexts(), root.contexts());
    assert!(!data.contexts().contains(note.reference().unwrap()));
}

#[test]
fn duplicate_patches_are_idempotent() {
    let list: Tree = make(json!({ "items": [1] }), None).unwrap();
    let items = list.subtree(&NodePath::parse("items")).unwrap();
    let item = make(json!({ "name": "Joe", "tags": ["a"] }), Some(&items)).unwrap();

    let once: Tree = stitch([&list, &item]).unwrap();
    let twice: Tree = stitch([&list, &item, &item]).unwrap();
    let main_again: Tree = stitch([&list, &item, &list]).unwrap();

    assert_eq!(twice, once);
    assert_eq!(main_again, once);
    assert_eq!(
        json_of(&once),
        json!({ "items": [1, { "name": "Joe", "tags": ["a"] }] })
    );
}

#[test]
fn orphan_patch_is_reported() {
    let list: Tree = make(json!([]), None).unwrap();
    let elsewhere: Tree = make(json!([]), None).unwrap();
    let first = make(json!({ "n": 1 }), Some(&list)).unwrap();
    let second = make(json!({ "n": 2 }), Some(&list)).unwrap();
    let orphan = make(json!({ "lost": true }), Some(&elsewhere)).unwrap();

    let outcome: Report = report([&list, &orphan, &first, &second]).unwrap();
    assert!(!outcome.is_complete());
    assert_eq!(outcome.stitched_count, 3);
    assert_eq!(outcome.unstitched, vec![orphan.clone()]);
    assert_eq!(
        json_of(outcome.data.as_ref().unwrap()),
        json!([{ "n": 1 }, { "n": 2 }])
    );

    let err = stitch::<Scalar, _, _>([&list, &orphan, &first, &second]).unwrap_err();
    assert_eq!(err, StitchError::IncompletePatchSet { remaining: 1 });
}

#[test]
fn no_main_patch() {
    let a: Tree = make(json!({ "a": 1 }), None).unwrap();
    let b: Tree = make(json!({ "b": 1 }), None).unwrap();

    let outcome: Report = report([&a, &b]).unwrap();
    assert!(outcome.data.is_none());
    assert_eq!(outcome.stitched_count, 0);
    assert_eq!(outcome.unstitched.len(), 2);

    let err = stitch::<Scalar, _, _>([&a, &b]).unwrap_err();
    assert_eq!(err, StitchError::NoMainPatch);

    // the oldest root wins, the other one cannot be attached anywhere
    let relaxed: Stitcher = Stitcher::with_config(StitchConfig {
        require_single_root: false,
        ..StitchConfig::default()
    });
    let outcome = relaxed.report([&a, &b]).unwrap();
    assert_eq!(outcome.data.as_ref().and_then(Tree::reference), a.reference());
    assert_eq!(outcome.unstitched, vec![b.clone()]);
}

#[test]
fn empty_patch_set_has_no_main_patch() {
    let patches: Vec<Tree> = Vec::new();
    let err = stitch::<Scalar, _, _>(patches).unwrap_err();
    assert_eq!(err, StitchError::NoMainPatch);
}

#[test]
fn malformed_wire_input_fails_immediately() {
    let list: Tree = make(json!([]), None).unwrap();
    let result = stitch::<Scalar, _, _>([
        Incoming::from(&list),
        Incoming::from("qz1:####"),
    ]);
    assert!(matches!(result, Err(StitchError::Wire(_))));
}

#[test]
fn custom_combiner_replaces_sequences() {
    let root: Tree = make(json!({ "tags": ["a"] }), None).unwrap();
    let mut update: Tree = make(&root, None).unwrap();
    update
        .set(&NodePath::parse("tags"), json!(["b"]))
        .unwrap();

    let default: Tree = stitch([&root, &update]).unwrap();
    assert_eq!(json_of(&default), json!({ "tags": ["a", "b"] }));

    let replacing = Stitcher::<Scalar>::new()
        .with_combiner(|_: &Node, source: &Node| source.is_seq().then(|| source.clone()));
    let data = replacing.stitch([&root, &update]).unwrap();
    assert_eq!(json_of(&data), json!({ "tags": ["b"] }));
}

#[test]
fn patches_collection_stitches_list() {
    let list: Tree = make(json!([]), None).unwrap();
    let first = make(json!({ "obj": 1 }), Some(&list)).unwrap();
    let second = make(json!({ "obj": 2 }), Some(&list)).unwrap();

    let mut patches: Patches = Patches::new();
    patches.add([&list, &first, &second]).unwrap();

    let data = patches.stitch().unwrap();
    assert_eq!(json_of(&data), json!([{ "obj": 1 }, { "obj": 2 }]));

    let imported: Patches = Patches::read(&patches.write().unwrap()).unwrap();
    assert_eq!(imported, patches);
    assert_eq!(imported.report().unwrap().stitched_count, 3);
}
