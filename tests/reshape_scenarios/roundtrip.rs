//! Generated round trips
//!
//! Random user graphs are flattened into the rows a
//! `users LEFT JOIN posts LEFT JOIN comments LEFT JOIN profiles` query would
//! return; reshaping them must give the graph back. Trees of random depth,
//! with a one-to-one detail on every level, are checked the same way.

use crate::common::*;
use proptest::prelude::*;
use rowgraph::reshape::clean;
use rowgraph::{Map, MarkerSet, ReshapeConfig, Reshaper};

#[derive(Clone, Debug)]
struct Post {
    title: String,
    comments: Vec<String>,
}

#[derive(Clone, Debug)]
struct User {
    name: String,
    posts: Vec<Post>,
    bio: Option<String>,
}

fn arb_post() -> impl Strategy<Value = Post> {
    ("[a-z]{1,6}", prop::collection::vec("[a-z]{1,6}", 0..3))
        .prop_map(|(title, comments)| Post { title, comments })
}

fn arb_user() -> impl Strategy<Value = User> {
    (
        "[a-z]{0,6}",
        prop::collection::vec(arb_post(), 0..3),
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(name, posts, bio)| User { name, posts, bio })
}

fn arb_users() -> impl Strategy<Value = Vec<User>> {
    prop::collection::vec(arb_user(), 0..6)
}

fn id(index: usize) -> Value {
    Value::Int(index as i64 + 1)
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Map>())
}

/// The nested graph the reshaper should produce
fn expected(users: &[User]) -> Vec<Value> {
    users
        .iter()
        .enumerate()
        .map(|(u, user)| {
            let posts = user
                .posts
                .iter()
                .enumerate()
                .map(|(p, post)| {
                    let comments = post
                        .comments
                        .iter()
                        .enumerate()
                        .map(|(c, body)| object([("id", id(c)), ("body", Value::from(body.as_str()))]))
                        .collect::<Vec<_>>();
                    object([
                        ("id", id(p)),
                        ("title", Value::from(post.title.as_str())),
                        ("comments", Value::Array(comments)),
                    ])
                })
                .collect::<Vec<_>>();
            let profile = match &user.bio {
                Some(bio) => object([("id", id(u)), ("bio", Value::from(bio.as_str()))]),
                None => Value::Null,
            };
            object([
                ("id", id(u)),
                ("name", Value::from(user.name.as_str())),
                ("posts", Value::Array(posts)),
                ("profile", profile),
            ])
        })
        .collect()
}

/// The joined rows, one per (user, post, comment) combination
fn flatten(users: &[User]) -> Vec<Row> {
    let mut out = Vec::new();
    for (u, user) in users.iter().enumerate() {
        let (profile_id, bio) = match &user.bio {
            Some(bio) => (id(u), Value::from(bio.as_str())),
            None => (Value::Null, Value::Null),
        };
        let mut push = |post_id: Value, title: Value, comment_id: Value, body: Value| {
            out.push(row([
                ("id##", id(u)),
                ("name", Value::from(user.name.as_str())),
                ("posts[].id##", post_id),
                ("posts[].title", title),
                ("posts[].comments[].id##", comment_id),
                ("posts[].comments[].body", body),
                ("profile{}.id##", profile_id.clone()),
                ("profile{}.bio", bio.clone()),
            ]));
        };

        if user.posts.is_empty() {
            push(Value::Null, Value::Null, Value::Null, Value::Null);
        }
        for (p, post) in user.posts.iter().enumerate() {
            let title = Value::from(post.title.as_str());
            if post.comments.is_empty() {
                push(id(p), title.clone(), Value::Null, Value::Null);
            }
            for (c, body) in post.comments.iter().enumerate() {
                push(id(p), title.clone(), id(c), Value::from(body.as_str()));
            }
        }
    }
    out
}

fn reshaper(threshold: usize) -> Reshaper {
    Reshaper::with_config(ReshapeConfig {
        specialize_threshold: threshold,
        ..ReshapeConfig::default()
    })
}

// =============================================================================
// Trees of random relation depth
// =============================================================================

/// One entity per level; `items[]` nests the next level, `detail{}` is a
/// one-to-one relation present on every level
#[derive(Clone, Debug)]
struct Node {
    name: String,
    detail: Option<String>,
    items: Vec<Node>,
}

/// Entity with `levels` levels below and including it
fn arb_node(levels: u32) -> BoxedStrategy<Node> {
    let own = ("[a-z]{0,4}", prop::option::of("[a-z]{1,4}"));
    if levels <= 1 {
        own.prop_map(|(name, detail)| Node { name, detail, items: Vec::new() })
            .boxed()
    } else {
        (own, prop::collection::vec(arb_node(levels - 1), 0..3))
            .prop_map(|((name, detail), items)| Node { name, detail, items })
            .boxed()
    }
}

/// `(relation depth, roots)`; depth counts the nested `items[]` levels
fn arb_tree() -> impl Strategy<Value = (u32, Vec<Node>)> {
    (1u32..=4).prop_flat_map(|depth| (Just(depth), prop::collection::vec(arb_node(depth + 1), 0..4)))
}

type Columns = Vec<(String, Value)>;

fn null_level(prefix: &str, levels: u32, out: &mut Columns) {
    for column in ["id##", "name", "detail{}.id##", "detail{}.note"] {
        out.push((format!("{prefix}{column}"), Value::Null));
    }
    if levels > 1 {
        null_level(&format!("{prefix}items[]."), levels - 1, out);
    }
}

fn flatten_node(node: &Node, index: usize, prefix: &str, levels: u32) -> Vec<Columns> {
    let (detail_id, note) = match &node.detail {
        Some(note) => (Value::Int(1), Value::from(note.as_str())),
        None => (Value::Null, Value::Null),
    };
    let own: Columns = vec![
        (format!("{prefix}id##"), id(index)),
        (format!("{prefix}name"), Value::from(node.name.as_str())),
        (format!("{prefix}detail{{}}.id##"), detail_id),
        (format!("{prefix}detail{{}}.note"), note),
    ];
    if levels <= 1 {
        return vec![own];
    }

    let child_prefix = format!("{prefix}items[].");
    if node.items.is_empty() {
        let mut columns = own;
        null_level(&child_prefix, levels - 1, &mut columns);
        return vec![columns];
    }
    node.items
        .iter()
        .enumerate()
        .flat_map(|(i, child)| flatten_node(child, i, &child_prefix, levels - 1))
        .map(|tail| {
            let mut columns = own.clone();
            columns.extend(tail);
            columns
        })
        .collect()
}

fn flatten_tree(depth: u32, roots: &[Node]) -> Vec<Row> {
    roots
        .iter()
        .enumerate()
        .flat_map(|(i, root)| flatten_node(root, i, "", depth + 1))
        .map(|columns| columns.into_iter().collect::<Row>())
        .collect()
}

fn expected_node(node: &Node, index: usize, levels: u32) -> Value {
    let mut fields = Map::new();
    fields.insert("id".to_string(), id(index));
    fields.insert("name".to_string(), Value::from(node.name.as_str()));
    let detail = match &node.detail {
        Some(note) => object([("id", Value::Int(1)), ("note", Value::from(note.as_str()))]),
        None => Value::Null,
    };
    fields.insert("detail".to_string(), detail);
    if levels > 1 {
        let items = node
            .items
            .iter()
            .enumerate()
            .map(|(i, child)| expected_node(child, i, levels - 1))
            .collect();
        fields.insert("items".to_string(), Value::Array(items));
    }
    Value::Object(fields)
}

fn expected_tree(depth: u32, roots: &[Node]) -> Vec<Value> {
    roots
        .iter()
        .enumerate()
        .map(|(i, root)| expected_node(root, i, depth + 1))
        .collect()
}

proptest! {
    #[test]
    fn flattened_graph_reshapes_back(users in arb_users()) {
        let output = Reshaper::new().process(flatten(&users));
        prop_assert_eq!(output, expected(&users));
    }

    #[test]
    fn planned_path_agrees_with_generic_path(users in arb_users()) {
        let generic = reshaper(usize::MAX).process(flatten(&users));
        let planned = reshaper(0).process(flatten(&users));
        prop_assert_eq!(generic, planned);
    }

    #[test]
    fn clean_is_idempotent(users in arb_users()) {
        let once = Value::Array(Reshaper::new().process(flatten(&users)));
        let twice = clean(once.clone(), &MarkerSet::all());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn trees_of_any_depth_reshape_back((depth, roots) in arb_tree()) {
        let output = Reshaper::new().process(flatten_tree(depth, &roots));
        prop_assert_eq!(output, expected_tree(depth, &roots));
    }

    #[test]
    fn deep_trees_agree_across_paths((depth, roots) in arb_tree()) {
        let generic = reshaper(usize::MAX).process(flatten_tree(depth, &roots));
        let planned = reshaper(0).process(flatten_tree(depth, &roots));
        prop_assert_eq!(generic, planned);
    }
}
