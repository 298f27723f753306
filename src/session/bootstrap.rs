use std::path::{Path, PathBuf};

use super::{keys, SessionParameters};

/// File whose presence marks the first argument as an installation root.
pub const LEAD_MARKER_FILE: &str = "lead.m";

const MNI_TEMPLATE_SUBDIR: [&str; 3] = ["templates", "space", "MNI_ICBM_2009b_NLIN_ASYM"];
const ATLASES_SUBDIR: &str = "atlases";
const ANTS_APPLY_TRANSFORMS_STEM: &str = "antsApplyTransforms";

/// Launch arguments supplied by an external caller: `<program> <root> <subject>...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapArgs {
    root: PathBuf,
    subject_paths: Vec<String>,
}

impl BootstrapArgs {
    pub fn from_env() -> Option<Self> {
        let args = std::env::args().collect::<Vec<_>>();
        Self::from_args(&args, |path| path.is_file())
    }

    /// Requires a root holding the marker file followed by at least one subject.
    pub fn from_args(args: &[String], is_file: impl Fn(&Path) -> bool) -> Option<Self> {
        if args.len() <= 2 {
            return None;
        }
        let root = PathBuf::from(&args[1]);
        if !is_file(&root.join(LEAD_MARKER_FILE)) {
            return None;
        }
        Some(Self {
            root,
            subject_paths: args[2..].to_vec(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subject_paths(&self) -> &[String] {
        &self.subject_paths
    }

    pub fn mni_path(&self) -> PathBuf {
        MNI_TEMPLATE_SUBDIR
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    pub fn ants_apply_transforms_path(&self) -> PathBuf {
        self.root
            .join("ext_libs")
            .join("ANTs")
            .join(format!("{ANTS_APPLY_TRANSFORMS_STEM}.{}", platform_extension()))
    }

    /// Writes the subject and template fields; the host then runs in reduced mode.
    pub fn apply(&self, params: &mut SessionParameters) -> bool {
        let separator = params.separator().to_string();
        let mni_path = self.mni_path();
        params.set(keys::SUBJECT_PATHS, self.subject_paths.join(&separator));
        params.set(keys::SUBJECT_N, "0");
        params.set(keys::SUBJECT_PATH, self.subject_paths[0].as_str());
        params.set(
            keys::MNI_ATLAS_PATH,
            mni_path.join(ATLASES_SUBDIR).to_string_lossy(),
        );
        params.set(keys::MNI_PATH, mni_path.to_string_lossy());
        params.set(
            keys::ANTS_APPLY_TRANSFORMS_PATH,
            self.ants_apply_transforms_path().to_string_lossy(),
        );
        tracing::info!(
            root = %self.root.display(),
            subjects = self.subject_paths.len(),
            "session bootstrapped by external caller"
        );
        true
    }
}

fn platform_extension() -> &'static str {
    match std::env::consts::OS {
        "macos" => "maci64",
        "windows" => "exe",
        _ => "glnxa64",
    }
}
