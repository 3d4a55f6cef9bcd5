//! Change resolution against real git repositories.

mod common;

use common::{commit_file, git, init_repo, write_file};

use diffcritic::diff::{self, ResolveError};
use diffcritic::models::{FileStatus, LineMarker, ReviewMode};

fn paths(changes: &[diffcritic::models::FileChange]) -> Vec<&str> {
    changes.iter().map(|c| c.path.as_str()).collect()
}

#[tokio::test]
async fn last_commit_on_root_commit_has_no_commits() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "a.txt", "a\n", "init");

    let err = diff::resolve(&ReviewMode::LastCommit, dir.path()).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoCommits), "got: {err}");
}

#[tokio::test]
async fn last_commit_on_empty_repository_has_no_commits() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let err = diff::resolve(&ReviewMode::LastCommit, dir.path()).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoCommits), "got: {err}");
}

#[tokio::test]
async fn last_commit_diffs_against_parent() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "src/lib.rs", "fn a() {}\n", "init");
    commit_file(p, "src/lib.rs", "fn a() {}\nfn b() {}\n", "add b");

    let changes = diff::resolve(&ReviewMode::LastCommit, p).await.unwrap();
    assert_eq!(paths(&changes), vec!["src/lib.rs"]);
    assert_eq!(changes[0].status, FileStatus::Modified);
    let added: Vec<_> = changes[0].hunks[0]
        .lines
        .iter()
        .filter(|l| l.marker == LineMarker::Added)
        .map(|l| l.text.as_str())
        .collect();
    assert_eq!(added, vec!["fn b() {}"]);
}

#[tokio::test]
async fn unknown_commit_is_unresolvable() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "a.txt", "a\n", "init");

    let err = diff::resolve(&ReviewMode::CommitRef("deadbeef".into()), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvableRef(ref r) if r == "deadbeef"));
}

#[tokio::test]
async fn commit_ref_reviews_only_that_commit() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "a.txt", "a\n", "init");
    let target = commit_file(p, "b.txt", "b\n", "add b");
    commit_file(p, "c.txt", "c\n", "add c");

    let changes = diff::resolve(&ReviewMode::CommitRef(target), p).await.unwrap();
    assert_eq!(paths(&changes), vec!["b.txt"]);
    assert_eq!(changes[0].status, FileStatus::Added);
}

#[tokio::test]
async fn commit_ref_on_root_commit_reviews_full_content() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    write_file(p, "a.txt", "a\n");
    let root = commit_file(p, "b.txt", "b\n", "init");

    let changes = diff::resolve(&ReviewMode::CommitRef(root), p).await.unwrap();
    assert_eq!(paths(&changes), vec!["a.txt", "b.txt"]);
    assert!(changes.iter().all(|c| c.status == FileStatus::Added));
}

#[tokio::test]
async fn branch_diff_uses_merge_base() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "shared.txt", "shared\n", "init");

    git(p, &["checkout", "-b", "feature"]);
    commit_file(p, "feature.txt", "feature work\n", "feature");

    git(p, &["checkout", "main"]);
    commit_file(p, "main.txt", "unrelated drift\n", "main moves on");

    let forward = diff::resolve(
        &ReviewMode::BranchDiff {
            base: "main".into(),
            head: "feature".into(),
        },
        p,
    )
    .await
    .unwrap();
    let backward = diff::resolve(
        &ReviewMode::BranchDiff {
            base: "feature".into(),
            head: "main".into(),
        },
        p,
    )
    .await
    .unwrap();

    // three-dot: each side sees only its own commits, never the other's drift
    assert_eq!(paths(&forward), vec!["feature.txt"]);
    assert_eq!(paths(&backward), vec!["main.txt"]);
    assert_ne!(forward, backward);
    assert!(forward.iter().all(|c| c.status == FileStatus::Added));
    assert!(backward.iter().all(|c| c.status == FileStatus::Added));
}

#[tokio::test]
async fn branch_diff_with_missing_ref_is_unresolvable() {
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    commit_file(dir.path(), "a.txt", "a\n", "init");

    let err = diff::resolve(
        &ReviewMode::BranchDiff {
            base: "no-such-branch".into(),
            head: "HEAD".into(),
        },
        dir.path(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvableRef(ref r) if r == "no-such-branch"));
}

#[tokio::test]
async fn branch_diff_of_disjoint_histories_has_no_common_ancestor() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "a.txt", "a\n", "init");
    git(p, &["checkout", "--orphan", "island"]);
    git(p, &["rm", "-rf", "--quiet", "."]);
    commit_file(p, "b.txt", "b\n", "orphan root");

    let err = diff::resolve(
        &ReviewMode::BranchDiff {
            base: "main".into(),
            head: "island".into(),
        },
        p,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ResolveError::NoCommonAncestor { .. }), "got: {err}");
}

#[tokio::test]
async fn staged_with_clean_index_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "a.txt", "a\n", "init");
    // unstaged edits are not part of the staged review
    write_file(p, "a.txt", "edited\n");

    let changes = diff::resolve(&ReviewMode::Staged, p).await.unwrap();
    assert!(changes.is_empty());
}

#[tokio::test]
async fn staged_sees_only_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "a.txt", "a\n", "init");
    write_file(p, "staged.txt", "in index\n");
    write_file(p, "unstaged.txt", "not in index\n");
    git(p, &["add", "staged.txt"]);

    let changes = diff::resolve(&ReviewMode::Staged, p).await.unwrap();
    assert_eq!(paths(&changes), vec!["staged.txt"]);
}

#[tokio::test]
async fn staged_before_first_commit() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    write_file(p, "new.txt", "hello\n");
    git(p, &["add", "new.txt"]);

    let changes = diff::resolve(&ReviewMode::Staged, p).await.unwrap();
    assert_eq!(paths(&changes), vec!["new.txt"]);
}

#[tokio::test]
async fn renames_deletes_and_binaries() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    write_file(p, "old_name.rs", "fn keep() {}\nfn also_keep() {}\nfn more() {}\n");
    commit_file(p, "gone.txt", "bye\n", "init");

    git(p, &["mv", "old_name.rs", "new_name.rs"]);
    git(p, &["rm", "--quiet", "gone.txt"]);
    std::fs::write(p.join("logo.bin"), [0u8, 159, 146, 150, 0, 1, 2]).unwrap();
    git(p, &["add", "--all"]);
    git(p, &["commit", "-m", "reshuffle"]);

    let changes = diff::resolve(&ReviewMode::LastCommit, p).await.unwrap();
    let by_path = |path: &str| changes.iter().find(|c| c.path == path).unwrap();

    assert_eq!(by_path("gone.txt").status, FileStatus::Deleted);
    assert_eq!(
        by_path("new_name.rs").status,
        FileStatus::Renamed {
            from: "old_name.rs".into()
        }
    );
    let binary = by_path("logo.bin");
    assert!(binary.binary);
    assert!(binary.hunks.is_empty());
}

#[tokio::test]
async fn resolution_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "z.txt", "z\n", "init");
    write_file(p, "b.txt", "b\n");
    write_file(p, "a/nested.txt", "n\n");
    commit_file(p, "z.txt", "zz\n", "more");

    let first = diff::resolve(&ReviewMode::LastCommit, p).await.unwrap();
    let second = diff::resolve(&ReviewMode::LastCommit, p).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(paths(&first), vec!["a/nested.txt", "b.txt", "z.txt"]);
}

#[tokio::test]
async fn repo_root_is_found_from_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "src/lib.rs", "\n", "init");

    let root = diff::git::find_repo_root(&p.join("src")).await.unwrap();
    assert_eq!(root.canonicalize().unwrap(), p.canonicalize().unwrap());
}

#[tokio::test]
async fn crlf_conversion_is_visible_in_lines() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    git(p, &["config", "core.autocrlf", "false"]);
    commit_file(p, "notes.txt", "one\ntwo\n", "init");
    commit_file(p, "notes.txt", "one\r\ntwo\r\n", "switch to crlf");

    let changes = diff::resolve(&ReviewMode::LastCommit, p).await.unwrap();
    let added: Vec<_> = changes[0].hunks[0]
        .lines
        .iter()
        .filter(|l| l.marker == LineMarker::Added)
        .map(|l| l.text.as_str())
        .collect();
    assert_eq!(added, vec!["one\r", "two\r"]);
}

#[tokio::test]
async fn non_utf8_file_does_not_hide_other_changes() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "a.rs", "fn a() {}\n", "init");
    std::fs::write(p.join("legacy.txt"), b"caf\xe9\n").unwrap();
    commit_file(p, "a.rs", "fn b() {}\n", "add latin-1 notes");

    let changes = diff::resolve(&ReviewMode::LastCommit, p).await.unwrap();
    assert_eq!(paths(&changes), vec!["a.rs", "legacy.txt"]);
    let legacy = &changes[1];
    assert!(!legacy.binary);
    assert_eq!(legacy.hunks[0].lines[0].text, "caf\u{FFFD}");
}

#[tokio::test]
async fn branch_diff_of_aliased_refs_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    init_repo(p);
    commit_file(p, "a.txt", "a\n", "init");

    for (base, head) in [("main", "main"), ("main", "refs/heads/main"), ("HEAD", "main")] {
        let err = diff::resolve(
            &ReviewMode::BranchDiff {
                base: base.into(),
                head: head.into(),
            },
            p,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ResolveError::IdenticalRefs { .. }), "got: {err}");
    }
}
