//! Sequence wildcard resolution.
//!
//! A path template may mark the frame number with a single `#` (variable
//! length) or a run of `?` (fixed length) in its filename. This module
//! decides which convention an expression uses, scans the filesystem for
//! the set of frame identifiers ("patches"), and verifies every input
//! file needed by every patch before any image is decoded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::foundation::error::{ExrmixError, ExrmixResult};

/// One unit of batch work: a resolved patch and its concrete output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The captured sequence identifier; empty for a single-file run.
    pub patch: String,
    /// Output path with the patch substituted in.
    pub output_path: String,
}

/// The full resolved batch, jobs ordered by patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Hash,
    Question(usize),
}

/// The wildcard group of one template: byte range within the whole
/// template string, always inside the filename component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Group {
    start: usize,
    len: usize,
    kind: GroupKind,
}

fn filename_start(template: &str) -> usize {
    template
        .rfind(['/', '\\'])
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Locate the wildcard group of a template, if any.
///
/// Only the filename component is inspected. More than one `#`, more than
/// one separate `?` run, or a mix of both in a single filename is an
/// error.
fn wildcard_group(template: &str) -> ExrmixResult<Option<Group>> {
    let name_start = filename_start(template);
    let name = &template[name_start..];

    let hash_count = name.matches('#').count();
    if hash_count > 1 {
        return Err(ExrmixError::wildcard(format!(
            "multiple '#' in '{template}'; use one wildcard group per filename"
        )));
    }

    let mut question_runs = Vec::new();
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'?' {
            let run_start = i;
            while i < bytes.len() && bytes[i] == b'?' {
                i += 1;
            }
            question_runs.push((run_start, i - run_start));
        } else {
            i += 1;
        }
    }
    if question_runs.len() > 1 {
        return Err(ExrmixError::wildcard(format!(
            "multiple '?' runs in '{template}'; use one wildcard group per filename"
        )));
    }

    match (hash_count, question_runs.first()) {
        (0, None) => Ok(None),
        (1, None) => {
            let pos = name_start + name.find('#').unwrap_or(0);
            Ok(Some(Group {
                start: pos,
                len: 1,
                kind: GroupKind::Hash,
            }))
        }
        (0, Some(&(pos, len))) => Ok(Some(Group {
            start: name_start + pos,
            len,
            kind: GroupKind::Question(len),
        })),
        _ => Err(ExrmixError::wildcard(format!(
            "'{template}' mixes '#' and '?' wildcards in one filename"
        ))),
    }
}

/// Substitute a patch into a template's wildcard group.
///
/// Templates without a wildcard are returned unchanged, which also covers
/// the empty patch of a single-file run.
pub fn substitute(template: &str, patch: &str) -> String {
    match wildcard_group(template) {
        Ok(Some(group)) => {
            let mut out = String::with_capacity(template.len() + patch.len());
            out.push_str(&template[..group.start]);
            out.push_str(patch);
            out.push_str(&template[group.start + group.len..]);
            out
        }
        _ => template.to_owned(),
    }
}

fn merge_convention(
    current: Option<GroupKind>,
    group: Option<Group>,
    template: &str,
) -> ExrmixResult<Option<GroupKind>> {
    let Some(group) = group else {
        return Ok(current);
    };
    match (current, group.kind) {
        (None, kind) => Ok(Some(kind)),
        (Some(GroupKind::Hash), GroupKind::Hash) => Ok(Some(GroupKind::Hash)),
        (Some(GroupKind::Question(a)), GroupKind::Question(b)) => {
            if a == b {
                Ok(Some(GroupKind::Question(a)))
            } else {
                Err(ExrmixError::wildcard(format!(
                    "'?' run in '{template}' has length {b}, but an earlier template uses length {a}"
                )))
            }
        }
        _ => Err(ExrmixError::wildcard(format!(
            "'{template}' mixes '#' and '?' wildcard conventions with another template"
        ))),
    }
}

/// Scan the template's directory for entries matching `prefix*suffix`
/// (case-insensitive) and capture the candidate patches.
fn discover(template: &str, group: Group) -> ExrmixResult<BTreeSet<String>> {
    let name_start = filename_start(template);
    let prefix = template[name_start..group.start].to_ascii_lowercase();
    let suffix = template[group.start + group.len..].to_ascii_lowercase();

    let dir: PathBuf = if name_start == 0 {
        PathBuf::from(".")
    } else {
        PathBuf::from(&template[..name_start - 1])
    };

    let entries = std::fs::read_dir(&dir)
        .map_err(|e| ExrmixError::read(dir.display().to_string(), e))?;

    let mut patches = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| ExrmixError::read(dir.display().to_string(), e))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let lower = name.to_ascii_lowercase();
        if lower.len() < prefix.len() + suffix.len()
            || !lower.starts_with(&prefix)
            || !lower.ends_with(&suffix)
        {
            continue;
        }
        let patch = &name[prefix.len()..name.len() - suffix.len()];
        if let GroupKind::Question(len) = group.kind
            && patch.len() != len
        {
            continue;
        }
        patches.insert(patch.to_owned());
    }
    Ok(patches)
}

/// Resolve the patch set and concrete output paths for one expression.
///
/// This is the all-or-nothing pre-flight gate: any wildcard inconsistency
/// or missing input aborts the run before a single image is loaded.
pub fn resolve(output_template: &str, input_templates: &[&str]) -> ExrmixResult<BatchPlan> {
    let output_group = wildcard_group(output_template)?;
    let mut convention = merge_convention(None, output_group, output_template)?;

    let mut input_groups = Vec::with_capacity(input_templates.len());
    for template in input_templates {
        let group = wildcard_group(template)?;
        convention = merge_convention(convention, group, template)?;
        input_groups.push(group);
    }

    let mut patches = BTreeSet::new();
    let mut any_templated = false;
    for (template, group) in input_templates.iter().zip(&input_groups) {
        if let Some(group) = group {
            any_templated = true;
            patches.extend(discover(template, *group)?);
        }
    }

    if !any_templated {
        patches.insert(String::new());
    } else if patches.is_empty() {
        return Err(ExrmixError::wildcard(format!(
            "no existing files match the sequence template(s) of '{}'",
            input_templates.join("', '")
        )));
    }

    // Pre-flight: every patch must have every input on disk. Collect all
    // misses before reporting.
    let mut missing = BTreeSet::new();
    for patch in &patches {
        for template in input_templates {
            let concrete = substitute(template, patch);
            if !Path::new(&concrete).exists() {
                missing.insert(concrete);
            }
        }
    }
    if !missing.is_empty() {
        return Err(ExrmixError::MissingInputs(missing.into_iter().collect()));
    }

    if output_group.is_none() && patches.len() > 1 {
        return Err(ExrmixError::wildcard(format!(
            "output '{output_template}' has no wildcard, but {} frames were discovered; \
             every frame would overwrite the same file",
            patches.len()
        )));
    }

    let jobs = patches
        .into_iter()
        .map(|patch| {
            let output_path = substitute(output_template, &patch);
            Job { patch, output_path }
        })
        .collect();

    Ok(BatchPlan { jobs })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = PathBuf::from("target").join("sequence_tests").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn template(dir: &Path, name: &str) -> String {
        dir.join(name).display().to_string()
    }

    #[test]
    fn hash_wildcard_discovers_all_frames() {
        let dir = scratch("hash_discovery");
        touch(&dir, "beauty_0001.exr");
        touch(&dir, "beauty_0002.exr");
        touch(&dir, "beauty_0010.exr");

        let input = template(&dir, "beauty_#.exr");
        let output = template(&dir, "out_#.exr");
        let plan = resolve(&output, &[&input]).unwrap();

        let patches: Vec<&str> = plan.jobs.iter().map(|j| j.patch.as_str()).collect();
        assert_eq!(patches, vec!["0001", "0002", "0010"]);
        assert_eq!(plan.jobs[2].output_path, template(&dir, "out_0010.exr"));
    }

    #[test]
    fn question_run_requires_exact_length() {
        let dir = scratch("question_length");
        touch(&dir, "x01.exr");
        touch(&dir, "x02.exr");
        touch(&dir, "x123.exr");

        let input = template(&dir, "x??.exr");
        let output = template(&dir, "y??.exr");
        let plan = resolve(&output, &[&input]).unwrap();

        let patches: Vec<&str> = plan.jobs.iter().map(|j| j.patch.as_str()).collect();
        assert_eq!(patches, vec!["01", "02"]);
    }

    #[test]
    fn discovery_matching_is_case_insensitive() {
        let dir = scratch("case_insensitive");
        touch(&dir, "Beauty_0001.EXR");

        let input = template(&dir, "beauty_#.exr");
        let output = template(&dir, "out_#.exr");
        let plan = resolve(&output, &[&input]);

        // The patch is discovered from the real entry name; the concrete
        // path keeps the template's casing, so pre-flight decides whether
        // the filesystem accepts it.
        match plan {
            Ok(plan) => {
                assert_eq!(plan.jobs.len(), 1);
                assert_eq!(plan.jobs[0].patch, "0001");
            }
            Err(ExrmixError::MissingInputs(missing)) => {
                assert_eq!(missing.len(), 1);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mixed_conventions_fail_before_any_io() {
        // Templates point at a directory that does not exist: the error
        // must come from convention checking, not from the scan.
        let err = resolve("no_such_dir/out_#.exr", &["no_such_dir/a_#.exr", "no_such_dir/b_?.exr"])
            .unwrap_err();
        assert!(matches!(err, ExrmixError::Wildcard(_)), "got: {err}");
    }

    #[test]
    fn multiple_groups_in_one_filename_fail() {
        let err = resolve("out_#.exr", &["a_#_#.exr"]).unwrap_err();
        assert!(matches!(err, ExrmixError::Wildcard(_)));

        let err = resolve("out_??.exr", &["a_??_??.exr"]).unwrap_err();
        assert!(matches!(err, ExrmixError::Wildcard(_)));
    }

    #[test]
    fn question_runs_must_share_one_length() {
        let err = resolve("out_??.exr", &["a_??.exr", "b_????.exr"]).unwrap_err();
        assert!(matches!(err, ExrmixError::Wildcard(_)));
    }

    #[test]
    fn wildcard_in_directory_is_ignored() {
        // Only the filename component carries the sequence marker.
        let group = wildcard_group("shots/#/beauty.exr").unwrap();
        assert!(group.is_none());
    }

    #[test]
    fn preflight_reports_every_missing_file() {
        let dir = scratch("preflight");
        touch(&dir, "beauty_0001.exr");
        touch(&dir, "beauty_0002.exr");
        touch(&dir, "mask_0001.exr");

        let beauty = template(&dir, "beauty_#.exr");
        let mask = template(&dir, "mask_#.exr");
        let output = template(&dir, "out_#.exr");
        let err = resolve(&output, &[&beauty, &mask]).unwrap_err();

        let ExrmixError::MissingInputs(missing) = err else {
            panic!("expected MissingInputs, got: {err}");
        };
        assert_eq!(missing, vec![template(&dir, "mask_0002.exr")]);
    }

    #[test]
    fn untemplated_inputs_yield_a_single_empty_patch() {
        let dir = scratch("untemplated");
        touch(&dir, "a.exr");
        touch(&dir, "b.exr");

        let a = template(&dir, "a.exr");
        let b = template(&dir, "b.exr");
        let output = template(&dir, "out.exr");
        let plan = resolve(&output, &[&a, &b]).unwrap();

        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].patch, "");
        assert_eq!(plan.jobs[0].output_path, output);
    }

    #[test]
    fn untemplated_output_with_many_frames_is_an_error() {
        let dir = scratch("output_overwrite");
        touch(&dir, "beauty_0001.exr");
        touch(&dir, "beauty_0002.exr");

        let input = template(&dir, "beauty_#.exr");
        let output = template(&dir, "out.exr");
        let err = resolve(&output, &[&input]).unwrap_err();
        assert!(matches!(err, ExrmixError::Wildcard(_)), "got: {err}");
    }

    #[test]
    fn template_matching_no_files_is_an_error() {
        let dir = scratch("no_matches");
        touch(&dir, "unrelated.exr");

        let input = template(&dir, "beauty_#.exr");
        let output = template(&dir, "out_#.exr");
        let err = resolve(&output, &[&input]).unwrap_err();
        assert!(matches!(err, ExrmixError::Wildcard(_)), "got: {err}");
    }

    #[test]
    fn substitute_replaces_the_group() {
        assert_eq!(substitute("beauty_#.exr", "0007"), "beauty_0007.exr");
        assert_eq!(substitute("beauty_???.exr", "012"), "beauty_012.exr");
        assert_eq!(substitute("plain.exr", "0007"), "plain.exr");
        assert_eq!(substitute("seq/beauty_#.exr", ""), "seq/beauty_.exr");
    }
}
