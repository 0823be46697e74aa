//! Alias discovery over realistic configuration trees

use std::fs;
use std::path::Path;

use gpubar_core::{AliasCandidate, SshConfigResolver};

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn names(found: &[AliasCandidate]) -> Vec<&str> {
    found.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn discovers_across_nested_includes() {
    let home = tempfile::tempdir().unwrap();
    let ssh = home.path().join(".ssh");
    write(
        &ssh.join("config"),
        "# personal\n\
         Include ~/.ssh/config.d/*\n\
         \n\
         Host lab-gpu lab-gpu-alt\n\
         \tHostName 192.168.1.40\n\
         \tUser researcher\n\
         \tPort 2200\n\
         \n\
         Host *\n\
         \tServerAliveInterval 30\n",
    );
    write(
        &ssh.join("config.d/work"),
        "Host train-*\n  User ops\nHost train-01\n  HostName 10.0.0.11\nInclude nested/deeper.conf\n",
    );
    write(&ssh.join("config.d/nested/deeper.conf"), "Host deep\n");
    write(&ssh.join("config.d/empty"), "");

    let found = SshConfigResolver::with_paths(ssh.join("config"), home.path()).discover();
    assert_eq!(names(&found), vec!["deep", "lab-gpu", "lab-gpu-alt", "train-01"]);

    let lab = &found[1];
    assert_eq!(lab.target, "researcher@192.168.1.40");
    assert_eq!(lab.port, 2200);
    assert_eq!(lab.source, "ssh_config");
    assert_eq!(found[3].target, "10.0.0.11");
}

#[test]
fn include_cycle_yields_each_file_once() {
    let home = tempfile::tempdir().unwrap();
    let ssh = home.path().join(".ssh");
    write(&ssh.join("config"), "Include a.conf\nHost root\n");
    write(&ssh.join("a.conf"), "Include b.conf\nHost in-a\n");
    write(&ssh.join("b.conf"), "Include a.conf\nInclude ../.ssh/config\nHost in-b\n");

    let found = SshConfigResolver::with_paths(ssh.join("config"), home.path()).discover();
    assert_eq!(names(&found), vec!["in-a", "in-b", "root"]);
}

#[test]
fn duplicates_across_files_collapse() {
    let home = tempfile::tempdir().unwrap();
    let ssh = home.path().join(".ssh");
    write(&ssh.join("config"), "Include extra\nHost box\n HostName 10.0.0.2\n");
    write(&ssh.join("extra"), "Host box\n HostName 10.0.0.2\nHost box\n HostName 10.0.0.3\n");

    let found = SshConfigResolver::with_paths(ssh.join("config"), home.path()).discover();
    let targets: Vec<&str> = found.iter().map(|c| c.target.as_str()).collect();
    assert_eq!(targets, vec!["10.0.0.2", "10.0.0.3"]);
}

#[cfg(unix)]
#[test]
fn unreadable_include_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let home = tempfile::tempdir().unwrap();
    let ssh = home.path().join(".ssh");
    write(&ssh.join("config"), "Include locked\nHost after\n");
    write(&ssh.join("locked"), "Host hidden\n");
    fs::set_permissions(ssh.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

    let found = SshConfigResolver::with_paths(ssh.join("config"), home.path()).discover();
    // root can still read the file, so only the survivor is guaranteed
    assert!(names(&found).contains(&"after"));

    fs::set_permissions(ssh.join("locked"), fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn root_path_that_is_a_directory_yields_empty() {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir_all(home.path().join(".ssh/config")).unwrap();
    let found =
        SshConfigResolver::with_paths(home.path().join(".ssh/config"), home.path()).discover();
    assert!(found.is_empty());
}

#[test]
fn candidates_serialize_for_front_end() {
    let home = tempfile::tempdir().unwrap();
    write(&home.path().join("config"), "Host g\n User u\n Port 22\n");
    let found = SshConfigResolver::with_paths(home.path().join("config"), home.path()).discover();
    let json = serde_json::to_value(&found).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{"name": "g", "target": "u@g", "port": 22, "source": "ssh_config"}])
    );
}
