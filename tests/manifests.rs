// ABOUTME: Property tests for manifest loading and image placeholder substitution.
// ABOUTME: Substitution must touch only the placeholder it was asked to replace.

use aksdeploy::deploy::{ManifestError, ManifestSet};
use proptest::prelude::*;
use std::fs;

const KEY: &str = "SERVICE_API_IMAGE_NAME";

fn load_single(content: &str) -> (tempfile::TempDir, ManifestSet) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("deployment.yaml"), content).unwrap();
    let set = ManifestSet::load(dir.path()).unwrap();
    (dir, set)
}

proptest! {
    #[test]
    fn substitution_preserves_surrounding_text(
        before in "[a-zA-Z0-9 :\n-]{0,80}",
        after in "[a-zA-Z0-9 :\n-]{0,80}",
        image in "[a-z0-9.]{1,20}/[a-z0-9-]{1,20}:[a-z0-9-]{1,20}",
    ) {
        let content = format!("{before}${{{KEY}}}{after}");
        let (_dir, set) = load_single(&content);

        let set = set.substitute(KEY, &image).unwrap();
        prop_assert_eq!(&set.files().head.content, &format!("{before}{image}{after}"));
    }

    #[test]
    fn other_placeholders_are_untouched(
        other in "[A-Z_]{1,20}",
        image in "[a-z0-9]{1,20}:[a-z0-9]{1,10}",
    ) {
        prop_assume!(other != KEY);
        let content = format!("image: ${{{KEY}}}\nenv: ${{{other}}}\n");
        let (_dir, set) = load_single(&content);

        let set = set.substitute(KEY, &image).unwrap();
        let rendered = set.render();
        let expected_image = format!("image: {image}\n");
        let expected_other = format!("${{{other}}}");
        prop_assert!(rendered.contains(&expected_image));
        prop_assert!(rendered.contains(&expected_other));
    }
}

#[test]
fn files_render_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b-service.yaml"), "kind: Service").unwrap();
    fs::write(dir.path().join("a-deployment.yaml"), "kind: Deployment\n").unwrap();
    fs::write(dir.path().join(".hidden.yaml"), "kind: Secret\n").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();

    let set = ManifestSet::load(dir.path()).unwrap();
    assert_eq!(set.files().len(), 2);
    assert_eq!(set.render(), "kind: Deployment\n---\nkind: Service\n");
}

#[test]
fn missing_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ManifestSet::load(&dir.path().join("manifests")).unwrap_err();
    assert!(matches!(err, ManifestError::DirectoryNotFound(_)));
}

#[test]
fn empty_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ManifestSet::load(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Empty(_)));
}

#[test]
fn placeholder_in_any_file_is_enough() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("service.yaml"), "kind: Service\n").unwrap();
    fs::write(
        dir.path().join("deployment.yaml"),
        format!("image: {}\n", ManifestSet::placeholder(KEY)),
    )
    .unwrap();

    let set = ManifestSet::load(dir.path())
        .unwrap()
        .substitute(KEY, "myacr.azurecr.io/shop/api:v1")
        .unwrap();
    assert!(set.render().contains("image: myacr.azurecr.io/shop/api:v1\n"));
}
