//! Load `.textharvest.toml` from a directory (CLI only). Lib callers build [`Opts`] themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HarvestToml {
    #[serde(default)]
    settings: HarvestSection,
}

#[derive(Debug, Default, Deserialize)]
struct HarvestSection {
    root: Option<String>,
    extensions: Option<Vec<String>>,
    allowed_paths: Option<Vec<String>>,
    file_handle_inherits_parent: Option<bool>,
    download_dir: Option<String>,
    max_concurrency: Option<usize>,
    pool_size: Option<usize>,
    max_file_mib: Option<u64>,
    fetch_command: Option<Vec<String>>,
    listing_command: Option<Vec<String>>,
    output: Option<String>,
    strict: Option<bool>,
    verbose: Option<bool>,
}

/// Parse settings text. Errors are logged and yield None.
pub(crate) fn parse_harvest_toml(s: &str, origin: &Path) -> Option<HarvestToml> {
    toml::from_str(s)
        .map_err(|e| log::warn!("{}: {}", origin.display(), e))
        .ok()
}

/// Load `.textharvest.toml` from `dir` if present. Returns None if file missing or unreadable.
pub(crate) fn load_harvest_toml(dir: &Path) -> Option<HarvestToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_harvest_toml(&s, &path)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $target:expr, $sec_field:ident => $target_field:ident) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $target.$target_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub(crate) fn apply_file_to_opts(file: &HarvestToml, opts: &mut Opts) {
    let sec = &file.settings;
    apply_file_opt!(sec, opts, root => root_name);
    apply_file_opt!(sec, opts.parse, extensions => extension_whitelist);
    apply_file_opt!(sec, opts.parse, allowed_paths => allowed_path_fragments);
    apply_file_opt!(sec, opts.parse, file_handle_inherits_parent => file_handle_inherits_parent);
    if let Some(ref d) = sec.download_dir {
        opts.pipeline.download_dir = PathBuf::from(d);
    }
    apply_file_opt!(sec, opts.pipeline, max_concurrency => max_concurrency);
    apply_file_opt!(sec, opts.pipeline, pool_size => pool_size);
    apply_file_opt!(sec, opts.pipeline, max_file_mib => max_file_mib);
    apply_file_opt!(sec, opts, fetch_command => fetch_command);
    apply_file_opt!(sec, opts, listing_command => listing_command);
    if let Some(ref o) = sec.output {
        opts.output = Some(PathBuf::from(o));
    }
    apply_file_opt!(sec, opts, strict => strict);
    apply_file_opt!(sec, opts, verbose => verbose);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let text = r#"
[settings]
root = "Drive"
extensions = [".pdf"]
allowed_paths = ["Algebra/Exams"]
pool_size = 3
max_file_mib = 10
download_dir = "out"
"#;
        let file = parse_harvest_toml(text, Path::new("test.toml")).unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.root_name, "Drive");
        assert_eq!(opts.parse.extension_whitelist, vec![".pdf".to_string()]);
        assert_eq!(
            opts.parse.allowed_path_fragments,
            vec!["Algebra/Exams".to_string()]
        );
        assert_eq!(opts.pipeline.pool_size, 3);
        assert_eq!(opts.pipeline.max_file_mib, 10);
        assert_eq!(opts.pipeline.download_dir, PathBuf::from("out"));
        // untouched
        assert!(opts.parse.file_handle_inherits_parent);
        assert!(!opts.strict);
    }

    #[test]
    fn missing_section_keeps_defaults() {
        let file = parse_harvest_toml("", Path::new("empty.toml")).unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.pipeline.pool_size, 5);
        assert_eq!(opts.pipeline.max_concurrency, 1024);
    }

    #[test]
    fn malformed_file_is_ignored() {
        assert!(parse_harvest_toml("[settings\npool_size = ", Path::new("bad.toml")).is_none());
    }
}
