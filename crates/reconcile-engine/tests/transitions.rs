mod common;

use common::{blob_content, commit_count, has_branch, head_message, tree_paths, FakeWatch, Fixture};
use fs_event_source::{FsEvent, WatchMessage};
use hardlink_replicator::is_same_file;
use ignore_list::IgnoreMatcher;
use reconcile_engine::{EngineError, Transition};
use std::fs;
use tokio::sync::mpsc;

#[test]
fn create_links_and_commits_on_new_branch() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let src = fx.write("a.txt", "hello");

    let result = engine.process(&FsEvent::create(&src)).unwrap();

    assert!(matches!(result, Transition::Committed { ref branch, .. } if branch == "main/a.txt"));
    assert_eq!(tree_paths(&fx.shadow_path, "main/a.txt"), vec!["base/a.txt"]);
    assert_eq!(head_message(&fx.shadow_path, "main/a.txt"), "File created: a.txt");
    assert_eq!(commit_count(&fx.shadow_path, "main/a.txt"), 2);
    assert!(is_same_file(&src, &fx.shadow_path.join("base/a.txt")).unwrap());
}

#[test]
fn nested_paths_keep_their_layout() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let src = fx.write("src/app/main.rs", "fn main() {}");

    engine.process(&FsEvent::create(&src)).unwrap();

    let branch = "main/src---app---main.rs";
    assert_eq!(tree_paths(&fx.shadow_path, branch), vec!["base/src/app/main.rs"]);
    assert_eq!(
        head_message(&fx.shadow_path, branch),
        "File created: src/app/main.rs"
    );
}

#[test]
fn each_file_branch_holds_only_its_file() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let a = fx.write("a.txt", "a1");
    let b = fx.write("b.txt", "b1");

    engine.process(&FsEvent::create(&a)).unwrap();
    engine.process(&FsEvent::create(&b)).unwrap();

    assert_eq!(tree_paths(&fx.shadow_path, "main/a.txt"), vec!["base/a.txt"]);
    assert_eq!(tree_paths(&fx.shadow_path, "main/b.txt"), vec!["base/b.txt"]);
}

#[test]
fn modify_on_another_branch_relinks_before_commit() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let a = fx.write("a.txt", "a1");
    let b = fx.write("b.txt", "b1");
    engine.process(&FsEvent::create(&a)).unwrap();
    engine.process(&FsEvent::create(&b)).unwrap();

    fs::write(&a, "a2").unwrap();
    let result = engine.process(&FsEvent::modify(&a)).unwrap();

    assert!(matches!(result, Transition::Committed { .. }));
    assert_eq!(blob_content(&fx.shadow_path, "main/a.txt", "base/a.txt"), "a2");
    assert_eq!(head_message(&fx.shadow_path, "main/a.txt"), "File modified: a.txt");
    assert!(is_same_file(&a, &fx.shadow_path.join("base/a.txt")).unwrap());
}

#[test]
fn modify_without_branch_acts_as_create() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let src = fx.write("late.txt", "x");

    engine.process(&FsEvent::modify(&src)).unwrap();

    assert_eq!(head_message(&fx.shadow_path, "main/late.txt"), "File created: late.txt");
}

#[test]
fn unchanged_modify_is_not_an_error() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let src = fx.write("a.txt", "same");
    engine.process(&FsEvent::create(&src)).unwrap();

    let result = engine.process(&FsEvent::modify(&src)).unwrap();

    assert_eq!(
        result,
        Transition::Unchanged {
            branch: "main/a.txt".into()
        }
    );
    assert_eq!(commit_count(&fx.shadow_path, "main/a.txt"), 2);
}

#[test]
fn move_without_branch_creates_new_branch() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let old = fx.root.join("old.txt");
    let new = fx.write("new.txt", "content");

    engine.process(&FsEvent::moved(&old, &new)).unwrap();

    assert!(has_branch(&fx.shadow_path, "main/new.txt"));
    assert!(!has_branch(&fx.shadow_path, "main/old.txt"));
    assert_eq!(head_message(&fx.shadow_path, "main/new.txt"), "File created: new.txt");
}

#[test]
fn move_drops_old_path_from_tree() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let old = fx.write("docs/old.md", "text");
    engine.process(&FsEvent::create(&old)).unwrap();

    let new = fx.root.join("docs/new.md");
    fs::rename(&old, &new).unwrap();
    engine.process(&FsEvent::moved(&old, &new)).unwrap();

    let branch = "main/docs---new.md";
    assert_eq!(tree_paths(&fx.shadow_path, branch), vec!["base/docs/new.md"]);
    assert_eq!(head_message(&fx.shadow_path, branch), "File moved: docs/new.md");
    assert!(!fx.shadow_path.join("base/docs/old.md").exists());
}

#[test]
fn atomic_save_over_tracked_file_commits_new_content() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let target = fx.write("a.txt", "v1");
    engine.process(&FsEvent::create(&target)).unwrap();

    // Editor writes a temp file and renames it over the target before
    // either event is handled.
    let tmp = fx.write("a.txt.tmp", "v2");
    fs::rename(&tmp, &target).unwrap();

    let created = engine.process(&FsEvent::create(&tmp)).unwrap();
    assert_eq!(
        created,
        Transition::Vanished {
            path: "a.txt.tmp".into()
        }
    );
    assert!(!has_branch(&fx.shadow_path, "main/a.txt.tmp"));

    let moved = engine.process(&FsEvent::moved(&tmp, &target)).unwrap();

    assert!(matches!(moved, Transition::Committed { ref branch, .. } if branch == "main/a.txt"));
    assert_eq!(blob_content(&fx.shadow_path, "main/a.txt", "base/a.txt"), "v2");
    assert!(is_same_file(&target, &fx.shadow_path.join("base/a.txt")).unwrap());
    assert!(!has_branch(&fx.shadow_path, "main/a.txt.tmp"));
}

#[test]
fn create_for_missing_file_makes_no_branch() {
    let fx = Fixture::new();
    let mut engine = fx.fake_engine();
    let ghost = fx.root.join("ghost.txt");

    let result = engine.handle(&FsEvent::create(&ghost));

    assert!(matches!(result, Some(Transition::Vanished { .. })));
    assert_eq!(engine.store().create_calls.get(), 0);
    assert_eq!(engine.stats().failed, 0);
}

#[test]
fn remove_unlinks_and_commits_deletion() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let src = fx.write("a.txt", "bye");
    engine.process(&FsEvent::create(&src)).unwrap();

    fs::remove_file(&src).unwrap();
    let result = engine.process(&FsEvent::remove(&src)).unwrap();

    assert!(matches!(result, Transition::Committed { .. }));
    assert!(tree_paths(&fx.shadow_path, "main/a.txt").is_empty());
    assert_eq!(head_message(&fx.shadow_path, "main/a.txt"), "File deleted: a.txt");
    assert!(!fx.shadow_path.join("base/a.txt").exists());
}

#[test]
fn head_write_switches_branch_namespace() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    assert_eq!(engine.main_branch(), "refs/heads/main");

    fx.set_head("feature/x");
    let result = engine.process(&FsEvent::modify(&fx.head_file)).unwrap();
    assert_eq!(
        result,
        Transition::MainBranchUpdated {
            branch: "refs/heads/feature/x".into(),
            changed: true
        }
    );

    let src = fx.write("c.txt", "c");
    engine.process(&FsEvent::create(&src)).unwrap();
    assert!(has_branch(&fx.shadow_path, "feature---x/c.txt"));
}

#[test]
fn same_head_write_reports_no_change() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    let result = engine.process(&FsEvent::create(&fx.head_file)).unwrap();

    assert_eq!(
        result,
        Transition::MainBranchUpdated {
            branch: "refs/heads/main".into(),
            changed: false
        }
    );
}

#[test]
fn detached_head_uses_placeholder_segment() {
    let fx = Fixture::new();
    fs::write(&fx.head_file, "3f786850e387550fdab836ed7e6dc881de23001b\n").unwrap();
    let mut engine = fx.engine();
    assert_eq!(engine.main_branch(), "");

    let src = fx.write("a.txt", "a");
    engine.process(&FsEvent::create(&src)).unwrap();

    assert!(has_branch(&fx.shadow_path, "detached/a.txt"));
}

#[test]
fn head_removal_rewatches_until_file_returns() {
    let fx = Fixture::new();
    let watch = FakeWatch::missing_for(2);
    let mut engine = fx.engine().with_head_watch(Box::new(watch.clone()));

    fx.set_head("develop");
    let result = engine.process(&FsEvent::remove(&fx.head_file)).unwrap();

    assert_eq!(
        result,
        Transition::HeadRewatched {
            branch: "refs/heads/develop".into()
        }
    );
    assert_eq!(watch.call_count(), 3);
}

#[test]
fn head_removal_gives_up_after_bounded_retries() {
    let fx = Fixture::new();
    let watch = FakeWatch::missing_for(100);
    let mut engine = fx.engine().with_head_watch(Box::new(watch.clone()));

    let err = engine.process(&FsEvent::remove(&fx.head_file)).unwrap_err();

    assert!(matches!(err, EngineError::Watch(_)));
    assert!(err.is_not_found());
    assert_eq!(watch.call_count(), 5);
}

#[test]
fn head_lock_renamed_into_place_rereads_branch() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    fx.set_head("topic");
    let lock = fx.head_file.with_file_name("HEAD.lock");
    let result = engine.process(&FsEvent::moved(&lock, &fx.head_file)).unwrap();

    assert!(matches!(result, Transition::MainBranchUpdated { changed: true, .. }));
    assert_eq!(engine.main_branch(), "refs/heads/topic");
}

#[test]
fn pattern_matches_are_ignored() {
    let fx = Fixture::new();
    let matcher = IgnoreMatcher::from_patterns(&fx.root, &["*.log", "target/"]).unwrap();
    let mut engine = fx.engine().with_matcher(matcher);

    let log = fx.write("debug.log", "noise");
    let artifact = fx.write("target/out.bin", "bin");

    assert_eq!(engine.process(&FsEvent::create(&log)).unwrap(), Transition::Ignored);
    assert_eq!(engine.process(&FsEvent::create(&artifact)).unwrap(), Transition::Ignored);
    assert!(!has_branch(&fx.shadow_path, "main/debug.log"));
}

#[test]
fn directories_are_skipped() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let dir = fx.root.join("subdir");
    fs::create_dir_all(&dir).unwrap();

    assert_eq!(
        engine.process(&FsEvent::create(&dir)).unwrap(),
        Transition::SkippedDirectory
    );
}

#[test]
fn events_inside_shadow_repository_are_ignored() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let inner = fx.shadow_path.join("base/a.txt");

    assert_eq!(engine.process(&FsEvent::create(&inner)).unwrap(), Transition::Ignored);
}

#[test]
fn paths_outside_root_are_rejected() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let stray = fx.root.parent().unwrap().join("elsewhere.txt");

    let err = engine.process(&FsEvent::create(&stray)).unwrap_err();
    assert!(matches!(err, EngineError::OutsideRoot(_)));
}

#[test]
fn run_drains_queue_and_survives_failures() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let a = fx.write("a.txt", "a");
    let (tx, mut rx) = mpsc::unbounded_channel();

    tx.send(WatchMessage::Event(FsEvent::remove(fx.root.join("ghost.txt"))))
        .unwrap();
    tx.send(WatchMessage::Error("backend hiccup".into())).unwrap();
    tx.send(WatchMessage::Event(FsEvent::create(&a))).unwrap();
    tx.send(WatchMessage::Shutdown).unwrap();
    tx.send(WatchMessage::Event(FsEvent::modify(&a))).unwrap();

    let stats = engine.run(&mut rx);

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.failed, 1);
    assert!(has_branch(&fx.shadow_path, "main/a.txt"));
    assert_eq!(commit_count(&fx.shadow_path, "main/a.txt"), 2);
}

#[test]
fn run_stops_when_senders_are_gone() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let (tx, mut rx) = mpsc::unbounded_channel::<WatchMessage>();
    drop(tx);

    assert_eq!(engine.run(&mut rx).processed, 0);
}
