//! Generate the module tree and skeleton for a new check.
//!
//! A check's code lives at the module path mirroring its id, so
//! `opentype/STAT/ital_axis` goes in `opentype/STAT/ital_axis.rs` under the
//! checks root, with every directory on the way declaring the next module.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use fontqa_core::{check::module_name, CheckId};
use log::debug;

use crate::Error;

/// What to put in a new check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSkeleton {
    pub id: CheckId,
    pub title: String,
    pub rationale: String,
    pub proposals: Vec<String>,
}

impl CheckSkeleton {
    pub fn new(id: CheckId) -> Self {
        CheckSkeleton {
            title: format!("TODO: describe {}", id.leaf()),
            id,
            rationale: String::new(),
            proposals: Vec::new(),
        }
    }

    /// The source of the leaf module
    pub fn source(&self) -> String {
        let function = module_name(&self.id.leaf().to_lowercase());
        let mut source = String::new();
        source.push_str("use fontqa_core::{prelude::*, Error};\n\n");
        source.push_str("pub fn check() -> Result<Check, Error> {\n");
        source.push_str("    Ok(Check::one(\n");
        source.push_str(&format!("        {:?},\n", self.id.to_string()));
        source.push_str(&format!("        {:?},\n", self.title));
        source.push_str(&format!("        {function},\n"));
        source.push_str("    )?\n");
        source.push_str(&format!("    .rationale({:?})\n", self.rationale));
        for proposal in self.proposals.iter() {
            source.push_str(&format!("    .proposal({proposal:?})\n"));
        }
        source.push_str("    .build())\n}\n\n");
        source.push_str(&format!(
            "fn {function}(t: &Testable, _context: &Context) -> CheckFnResult {{\n"
        ));
        source.push_str("    let _font = t.font()?;\n");
        source.push_str("    return_result(vec![])\n}\n");
        source
    }
}

/// What [scaffold] did to the filesystem
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scaffolded {
    /// Files that did not exist before
    pub created: Vec<PathBuf>,
    /// mod.rs files that gained a declaration
    pub updated: Vec<PathBuf>,
    /// Set if the leaf already existed and was left alone
    pub kept: Option<PathBuf>,
}

fn file_io(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    }
}

fn require_dir(dir: &Path) -> Result<(), Error> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::ExpectedDirectory(dir.to_path_buf()));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(file_io(dir))?;
        debug!("require_dir {:?}", dir);
    }
    Ok(())
}

/// The line declaring a child module, with the lint allowance for names
/// like `STAT` that keep the case of the id.
fn declaration(module: &str) -> String {
    if module.chars().any(|c| c.is_ascii_uppercase()) {
        format!("#[allow(non_snake_case)]\npub mod {module};\n")
    } else {
        format!("pub mod {module};\n")
    }
}

/// Does `source` declare `module`, with any visibility?
fn declares(source: &str, module: &str) -> bool {
    source
        .lines()
        .filter_map(|line| line.trim().strip_suffix(';'))
        .any(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            let [prefix @ .., "mod", name] = words.as_slice() else {
                return false;
            };
            *name == module
                && prefix
                    .iter()
                    .all(|w| w.starts_with("pub") || w.starts_with("#["))
        })
}

/// Make sure `dir/mod.rs` exists and declares `module`.
fn ensure_declared(dir: &Path, module: &str, done: &mut Scaffolded) -> Result<(), Error> {
    let mod_rs = dir.join("mod.rs");
    let existing = if mod_rs.is_file() {
        Some(fs::read_to_string(&mod_rs).map_err(file_io(&mod_rs))?)
    } else {
        None
    };
    if existing.as_deref().is_some_and(|s| declares(s, module)) {
        return Ok(());
    }
    let mut source = existing.clone().unwrap_or_default();
    if !source.is_empty() && !source.ends_with('\n') {
        source.push('\n');
    }
    source.push_str(&declaration(module));
    fs::write(&mod_rs, source).map_err(file_io(&mod_rs))?;
    if existing.is_some() {
        done.updated.push(mod_rs);
    } else {
        done.created.push(mod_rs);
    }
    Ok(())
}

/// Lay out the modules for a check under `root`.
///
/// Safe to run repeatedly: existing directories and declarations are reused
/// and an existing leaf file is never overwritten. Fails without touching
/// anything if the layout would need a module to be both a file and a
/// directory, or if the leaf file belongs to some other check.
pub fn scaffold(root: &Path, skeleton: &CheckSkeleton) -> Result<Scaffolded, Error> {
    let mut done = Scaffolded::default();
    let modules = skeleton.id.module_path();
    let Some((leaf, groups)) = modules.split_last() else {
        return Ok(done);
    };

    let collision = |path: PathBuf| Error::ModuleCollision {
        id: skeleton.id.to_string(),
        path,
    };
    // look before writing anything, a module is either a file or a directory
    let mut dir = root.to_path_buf();
    for group in groups {
        let group_file = dir.join(format!("{group}.rs"));
        if group_file.exists() {
            return Err(collision(group_file));
        }
        dir = dir.join(group);
    }
    let leaf_dir = dir.join(leaf);
    if leaf_dir.exists() {
        return Err(collision(leaf_dir));
    }
    let leaf_file = dir.join(format!("{leaf}.rs"));
    let existing = if leaf_file.is_file() {
        Some(fs::read_to_string(&leaf_file).map_err(file_io(&leaf_file))?)
    } else {
        None
    };
    // distinct ids can sanitize to the same module name
    if let Some(existing) = &existing {
        if !existing.contains(&format!("{:?}", skeleton.id.to_string())) {
            return Err(collision(leaf_file));
        }
    }

    require_dir(root)?;
    let mut dir = root.to_path_buf();
    for group in groups {
        ensure_declared(&dir, group, &mut done)?;
        dir = dir.join(group);
        require_dir(&dir)?;
    }
    ensure_declared(&dir, leaf, &mut done)?;

    if existing.is_some() {
        debug!("{} exists, leaving it alone", leaf_file.display());
        done.kept = Some(leaf_file);
    } else {
        fs::write(&leaf_file, skeleton.source()).map_err(file_io(&leaf_file))?;
        done.created.push(leaf_file);
    }
    Ok(done)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    use super::*;

    fn skeleton(id: &str) -> CheckSkeleton {
        CheckSkeleton {
            title: "Is it \"good\"?".to_string(),
            rationale: "Because.".to_string(),
            proposals: vec!["https://example.com/1".to_string()],
            ..CheckSkeleton::new(CheckId::new(id).unwrap())
        }
    }

    fn read(temp_dir: &TempDir, path: &str) -> String {
        fs::read_to_string(temp_dir.path().join(path)).unwrap()
    }

    #[test]
    fn creates_the_module_tree() {
        let temp_dir = tempdir().unwrap();
        let done = scaffold(temp_dir.path(), &skeleton("opentype/STAT/ital_axis")).unwrap();
        assert_eq!(
            vec![
                temp_dir.path().join("mod.rs"),
                temp_dir.path().join("opentype/mod.rs"),
                temp_dir.path().join("opentype/STAT/mod.rs"),
                temp_dir.path().join("opentype/STAT/ital_axis.rs"),
            ],
            done.created
        );
        assert_eq!("pub mod opentype;\n", read(&temp_dir, "mod.rs"));
        assert_eq!(
            "#[allow(non_snake_case)]\npub mod STAT;\n",
            read(&temp_dir, "opentype/mod.rs")
        );
        assert_eq!("pub mod ital_axis;\n", read(&temp_dir, "opentype/STAT/mod.rs"));
    }

    #[test]
    fn leaf_carries_the_metadata() {
        let source = skeleton("opentype/STAT/ital_axis").source();
        assert!(source.contains("\"opentype/STAT/ital_axis\",\n"), "{source}");
        assert!(source.contains("\"Is it \\\"good\\\"?\",\n"), "{source}");
        assert!(source.contains(".rationale(\"Because.\")"), "{source}");
        assert!(source.contains(".proposal(\"https://example.com/1\")"), "{source}");
        assert!(source.contains("fn ital_axis(t: &Testable"), "{source}");
    }

    #[test]
    fn function_names_are_snake_case() {
        let source = skeleton("opentype/varfont/STAT_axis_record_for_each_axis").source();
        assert!(source.contains("fn stat_axis_record_for_each_axis("), "{source}");
    }

    #[test]
    fn siblings_reuse_the_tree() {
        let temp_dir = tempdir().unwrap();
        scaffold(temp_dir.path(), &skeleton("opentype/STAT/ital_axis")).unwrap();
        let done = scaffold(temp_dir.path(), &skeleton("opentype/STAT/has_axis_value_tables"))
            .unwrap();
        assert_eq!(
            vec![temp_dir.path().join("opentype/STAT/has_axis_value_tables.rs")],
            done.created
        );
        assert_eq!(vec![temp_dir.path().join("opentype/STAT/mod.rs")], done.updated);
        assert_eq!(
            "pub mod ital_axis;\npub mod has_axis_value_tables;\n",
            read(&temp_dir, "opentype/STAT/mod.rs")
        );
        assert_eq!("pub mod opentype;\n", read(&temp_dir, "mod.rs"));
    }

    #[test]
    fn existing_leaf_is_never_overwritten() {
        let temp_dir = tempdir().unwrap();
        scaffold(temp_dir.path(), &skeleton("no_debugging_tables")).unwrap();
        let leaf = temp_dir.path().join("no_debugging_tables.rs");
        let hand_written = "// hand written\nCheck::one(\"no_debugging_tables\", ...)\n";
        fs::write(&leaf, hand_written).unwrap();

        let done = scaffold(temp_dir.path(), &skeleton("no_debugging_tables")).unwrap();
        assert_eq!(Some(leaf.clone()), done.kept);
        assert!(done.created.is_empty() && done.updated.is_empty());
        assert_eq!(hand_written, fs::read_to_string(leaf).unwrap());
    }

    #[test]
    fn existing_declarations_are_recognised() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("mod.rs"),
            "//! Checks\n\n#[allow(non_snake_case)]\n    mod opentype;",
        )
        .unwrap();
        let done = scaffold(temp_dir.path(), &skeleton("opentype/fvar/regular_coords")).unwrap();
        assert!(!done.updated.contains(&temp_dir.path().join("mod.rs")));
        assert!(temp_dir.path().join("opentype/fvar/regular_coords.rs").is_file());
    }

    #[test]
    fn restricted_visibility_counts_as_declared() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("mod.rs"),
            "pub(crate) mod opentype;\n#[cfg(test)] mod tests;\n",
        )
        .unwrap();
        let done = scaffold(temp_dir.path(), &skeleton("opentype/fvar/regular_coords")).unwrap();
        assert!(!done.updated.contains(&temp_dir.path().join("mod.rs")));
        assert!(!declares("pub mod opentype_extra;", "opentype"));
        assert!(!declares("// mod opentype;", "opentype"));
    }

    #[test]
    fn check_cannot_become_a_group() {
        let temp_dir = tempdir().unwrap();
        scaffold(temp_dir.path(), &skeleton("a/b")).unwrap();
        let result = scaffold(temp_dir.path(), &skeleton("a/b/c"));
        assert!(
            matches!(&result, Err(Error::ModuleCollision { path, .. }) if path.ends_with("a/b.rs")),
            "{result:?}"
        );
        assert!(!temp_dir.path().join("a/b").exists());
    }

    #[test]
    fn group_cannot_become_a_check() {
        let temp_dir = tempdir().unwrap();
        scaffold(temp_dir.path(), &skeleton("a/b/c")).unwrap();
        let before = read(&temp_dir, "a/mod.rs");
        let result = scaffold(temp_dir.path(), &skeleton("a/b"));
        assert!(
            matches!(&result, Err(Error::ModuleCollision { path, .. }) if path.ends_with("a/b")),
            "{result:?}"
        );
        assert!(!temp_dir.path().join("a/b.rs").exists());
        assert_eq!(before, read(&temp_dir, "a/mod.rs"));
    }

    #[test]
    fn ids_sharing_a_module_name_collide() {
        let temp_dir = tempdir().unwrap();
        scaffold(temp_dir.path(), &skeleton("a/my-check")).unwrap();
        let result = scaffold(temp_dir.path(), &skeleton("a/my_check"));
        assert!(
            matches!(&result, Err(Error::ModuleCollision { id, .. }) if id == "a/my_check"),
            "{result:?}"
        );
        assert_eq!("pub mod my_check;\n", read(&temp_dir, "a/mod.rs"));
    }

    #[test]
    fn keywords_and_digits_become_identifiers() {
        let temp_dir = tempdir().unwrap();
        scaffold(temp_dir.path(), &skeleton("type/3d-shapes")).unwrap();
        assert_eq!("pub mod type_;\n", read(&temp_dir, "mod.rs"));
        assert_eq!("pub mod _3d_shapes;\n", read(&temp_dir, "type_/mod.rs"));
        assert!(temp_dir.path().join("type_/_3d_shapes.rs").is_file());
    }

    #[test]
    fn root_must_be_a_directory() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("checks");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            scaffold(&file, &skeleton("a/b")),
            Err(Error::ExpectedDirectory(..))
        ));
    }
}
