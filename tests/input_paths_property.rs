use std::path::{Component, Path};

use proptest::prelude::*;
use spiceserver::job::workdir::validate_relative_path;

// Path-ish strings built from the pieces that matter: separators, dots and
// ordinary names.
fn path_strategy() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        Just("..".to_string()),
        Just(".".to_string()),
        Just(String::new()),
        "[a-zA-Z0-9_-]{1,8}(\\.[a-z]{1,3})?",
    ];
    (any::<bool>(), proptest::collection::vec(segment, 1..6), any::<bool>()).prop_map(
        |(leading_slash, segments, trailing_slash)| {
            let mut s = segments.join("/");
            if leading_slash {
                s.insert(0, '/');
            }
            if trailing_slash {
                s.push('/');
            }
            s
        },
    )
}

proptest! {
    #[test]
    fn accepted_paths_stay_inside_the_job_dir(raw in path_strategy()) {
        if let Ok(path) = validate_relative_path(&raw) {
            prop_assert!(path.is_relative());
            prop_assert!(path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)));
            prop_assert!(path.components().any(|c| matches!(c, Component::Normal(_))));

            let root = Path::new("/jobs/spice_server.abc");
            prop_assert!(root.join(&path).starts_with(root));
        }
    }

    #[test]
    fn parent_components_are_always_rejected(raw in path_strategy()) {
        let has_parent = raw.split('/').any(|segment| segment == "..");
        if has_parent || raw.starts_with('/') {
            prop_assert!(validate_relative_path(&raw).is_err());
        }
    }

    #[test]
    fn plain_relative_names_are_accepted(
        segments in proptest::collection::vec("[a-zA-Z0-9_]{1,8}", 1..5)
    ) {
        let raw = segments.join("/");
        let path = validate_relative_path(&raw).expect("plain relative path is valid");
        prop_assert_eq!(path, Path::new(&raw).to_path_buf());
    }
}
