//! Source discovery and per-file compilation.
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};

use crate::{
    compiler,
    error::{JackError, JackResult},
    syntax::TokenStream,
    vm::{CodeSink, Instr, VmWriter},
    xml::{self, TreeWriter},
};

pub const SOURCE_EXTENSION: &str = "jack";
pub const OUTPUT_EXTENSION: &str = "vm";
/// Appended to an output file name while it is being written.
const PARTIAL_SUFFIX: &str = ".tmp";

/// Compiler configuration.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerConf {
    /// Also write the token stream of each unit as `<Name>T.xml`.
    pub emit_tokens: bool,
    /// Also write the parse tree of each unit as `<Name>.xml`.
    pub emit_tree: bool,
    /// Directory for output files. Defaults to the directory of each source file.
    pub output_dir: Option<PathBuf>,
}

/// Resolve a path to the compilation units it names.
///
/// A `.jack` file is a single unit. A directory yields every `.jack`
/// file directly inside it, sorted by file name.
pub fn collect_sources(path: impl AsRef<Path>) -> JackResult<Vec<PathBuf>> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut sources = vec![];
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && is_source_file(&entry_path) {
                sources.push(entry_path);
            }
        }
        sources.sort();
        debug!("found {} source files in {}", sources.len(), path.display());
        Ok(sources)
    } else if path.is_file() && is_source_file(path) {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(JackError::Source(path.to_path_buf()))
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == SOURCE_EXTENSION)
}

/// Path of an output file for the given source, named after its
/// file stem plus the given suffix.
pub fn output_path(source: &Path, suffix: &str, conf: &CompilerConf) -> PathBuf {
    let stem = source.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let file_name = format!("{stem}{suffix}");

    match &conf.output_dir {
        Some(dir) => dir.join(file_name),
        None => source.with_file_name(file_name),
    }
}

pub fn read_source(path: impl AsRef<Path>) -> JackResult<String> {
    let file_bytes = fs::read(path.as_ref())?;
    Ok(String::from_utf8(file_bytes)?)
}

/// Write the token XML for one unit, returning the path written.
pub fn write_token_file(path: impl AsRef<Path>, conf: &CompilerConf) -> JackResult<PathBuf> {
    let path = path.as_ref();
    let source_code = read_source(path)?;
    let tokens = TokenStream::from_source(&source_code)?;
    emit_token_file(path, &tokens, conf)
}

fn emit_token_file(path: &Path, tokens: &TokenStream, conf: &CompilerConf) -> JackResult<PathBuf> {
    let out_path = output_path(path, "T.xml", conf);
    write_output(&out_path, |writer| {
        xml::write_tokens(tokens.source_code(), tokens.tokens(), writer)
    })?;
    Ok(out_path)
}

/// Write the parse tree XML for one unit, returning the path written.
///
/// The unit is fully compiled, so the tree is only written for a
/// class that also produces code.
pub fn write_tree_file(path: impl AsRef<Path>, conf: &CompilerConf) -> JackResult<PathBuf> {
    let path = path.as_ref();
    let source_code = read_source(path)?;
    let tokens = TokenStream::from_source(&source_code)?;

    let mut tree = TreeWriter::new(Vec::new());
    compiler::compile_class_with_tree(tokens, &mut Vec::<Instr>::new(), &mut tree)?;

    emit_tree_file(path, &tree.finish()?, conf)
}

fn emit_tree_file(path: &Path, tree: &[u8], conf: &CompilerConf) -> JackResult<PathBuf> {
    let out_path = output_path(path, ".xml", conf);
    write_output(&out_path, |writer| Ok(writer.write_all(tree)?))?;
    Ok(out_path)
}

/// Write an output file through a sibling with [`PARTIAL_SUFFIX`] appended,
/// which is renamed over the target once the contents are complete.
///
/// On failure the partial file is removed and the target is left untouched.
fn write_output<F>(out_path: &Path, contents: F) -> JackResult<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> JackResult<()>,
{
    let mut file_name = out_path.file_name().unwrap_or_default().to_os_string();
    file_name.push(PARTIAL_SUFFIX);
    let partial_path = out_path.with_file_name(file_name);

    let result = fs::File::create(&partial_path)
        .map_err(JackError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            contents(&mut writer)?;
            writer.flush()?;
            Ok(())
        })
        .and_then(|()| fs::rename(&partial_path, out_path).map_err(JackError::from));

    match result {
        Ok(()) => {
            debug!("wrote {}", out_path.display());
            Ok(())
        }
        Err(err) => {
            if partial_path.exists() {
                if let Err(remove_err) = fs::remove_file(&partial_path) {
                    warn!("failed to remove {}: {}", partial_path.display(), remove_err);
                }
            }
            Err(err)
        }
    }
}

/// Compile one source file, returning the path of the written `.vm` file.
///
/// Output files are only written once the whole unit has compiled.
pub fn compile_file(path: impl AsRef<Path>, conf: &CompilerConf) -> JackResult<PathBuf> {
    let path = path.as_ref();
    info!("compiling {}", path.display());

    let source_code = read_source(path)?;
    let tokens = TokenStream::from_source(&source_code)?;

    if conf.emit_tokens {
        emit_token_file(path, &tokens, conf)?;
    }

    let mut code: Vec<Instr> = vec![];
    let mut tree = if conf.emit_tree {
        Some(TreeWriter::new(Vec::new()))
    } else {
        None
    };
    let class_name = match tree.as_mut() {
        Some(tree) => compiler::compile_class_with_tree(tokens, &mut code, tree)?,
        None => compiler::compile_class(tokens, &mut code)?,
    };

    if path.file_stem().map_or(true, |stem| stem != class_name.as_str()) {
        warn!("class {} is declared in {}", class_name, path.display());
    }

    if let Some(tree) = tree {
        emit_tree_file(path, &tree.finish()?, conf)?;
    }

    let out_path = output_path(path, &format!(".{OUTPUT_EXTENSION}"), conf);
    write_output(&out_path, |writer| {
        let mut vm_writer = VmWriter::new(writer);
        for instr in code {
            vm_writer.emit(instr)?;
        }
        vm_writer.finish()?;
        Ok(())
    })?;

    Ok(out_path)
}

/// Compile every unit the path names, in order.
///
/// Stops at the first unit that fails. Files written for earlier
/// units are kept.
pub fn compile_path(path: impl AsRef<Path>, conf: &CompilerConf) -> JackResult<Vec<PathBuf>> {
    let sources = collect_sources(path)?;

    if let Some(dir) = &conf.output_dir {
        fs::create_dir_all(dir)?;
    }

    let mut outputs = Vec::with_capacity(sources.len());
    for source in &sources {
        match compile_file(source, conf) {
            Ok(out_path) => outputs.push(out_path),
            Err(err) => {
                error!("failed to compile {}", source.display());
                return Err(err);
            }
        }
    }

    Ok(outputs)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Fresh scratch directory per test.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jack-driver-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const MAIN: &str = "class Main { function void main() { do Output.printInt(1 + 2); return; } }";

    #[test]
    fn test_collect_sources_sorted() {
        let dir = scratch_dir("collect");
        fs::write(dir.join("Main.jack"), MAIN).unwrap();
        fs::write(dir.join("Ball.jack"), "class Ball { }").unwrap();
        fs::write(dir.join("notes.txt"), "not a source").unwrap();
        fs::create_dir(dir.join("Nested.jack")).unwrap();

        let sources = collect_sources(&dir).unwrap();
        assert_eq!(sources, vec![dir.join("Ball.jack"), dir.join("Main.jack")]);

        assert_eq!(collect_sources(dir.join("Main.jack")).unwrap(), vec![dir.join("Main.jack")]);
        assert!(matches!(
            collect_sources(dir.join("notes.txt")),
            Err(JackError::Source(_))
        ));
        assert!(matches!(
            collect_sources(dir.join("Missing.jack")),
            Err(JackError::Source(_))
        ));
    }

    #[test]
    fn test_output_path() {
        let source = Path::new("games").join("Pong.jack");

        let conf = CompilerConf::default();
        assert_eq!(output_path(&source, ".vm", &conf), Path::new("games").join("Pong.vm"));

        let conf = CompilerConf {
            output_dir: Some(PathBuf::from("build")),
            ..CompilerConf::default()
        };
        assert_eq!(output_path(&source, "T.xml", &conf), Path::new("build").join("PongT.xml"));
    }

    #[test]
    fn test_compile_file() {
        let dir = scratch_dir("compile");
        let source = dir.join("Main.jack");
        fs::write(&source, MAIN).unwrap();

        let conf = CompilerConf {
            emit_tokens: true,
            emit_tree: true,
            ..CompilerConf::default()
        };
        let out_path = compile_file(&source, &conf).unwrap();

        assert_eq!(out_path, dir.join("Main.vm"));
        assert_eq!(
            fs::read_to_string(&out_path).unwrap(),
            "function Main.main 0\n\
             push constant 1\n\
             push constant 2\n\
             add\n\
             call Output.printInt 1\n\
             pop temp 0\n\
             push constant 0\n\
             return\n"
        );

        let xml = fs::read_to_string(dir.join("MainT.xml")).unwrap();
        assert!(xml.starts_with("<tokens>\n<keyword> class </keyword>\n"));
        assert!(xml.ends_with("</tokens>\n"));

        let tree = fs::read_to_string(dir.join("Main.xml")).unwrap();
        assert!(tree.starts_with("<class>\n  <keyword> class </keyword>\n"));
        assert!(tree.ends_with("  <symbol> } </symbol>\n</class>\n"));

        let mut names = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["Main.jack", "Main.vm", "Main.xml", "MainT.xml"]);
    }

    #[test]
    fn test_write_tree_file() {
        let dir = scratch_dir("tree");
        let source = dir.join("Main.jack");
        fs::write(&source, MAIN).unwrap();

        let out_path = write_tree_file(&source, &CompilerConf::default()).unwrap();
        assert_eq!(out_path, dir.join("Main.xml"));
        assert!(fs::read_to_string(&out_path).unwrap().contains("    <parameterList>\n    </parameterList>\n"));
        assert!(!dir.join("Main.vm").exists());

        fs::write(dir.join("Bad.jack"), "class Bad { function void f() { let = 1; } }").unwrap();
        let result = write_tree_file(dir.join("Bad.jack"), &CompilerConf::default());
        assert!(matches!(result, Err(JackError::Syntax(_))));
        assert!(!dir.join("Bad.xml").exists());
    }

    #[test]
    fn test_output_replaces_previous_file() {
        let dir = scratch_dir("replace");
        let source = dir.join("Main.jack");
        fs::write(&source, MAIN).unwrap();
        fs::write(dir.join("Main.vm"), "stale\n").unwrap();

        compile_file(&source, &CompilerConf::default()).unwrap();

        let text = fs::read_to_string(dir.join("Main.vm")).unwrap();
        assert!(text.starts_with("function Main.main 0\n"));
        assert!(!dir.join("Main.vm.tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = scratch_dir("interrupted");
        let out_path = dir.join("Main.vm");
        fs::write(&out_path, "previous\n").unwrap();

        let result = write_output(&out_path, |writer| {
            writer.write_all(b"function Main.main 0\n")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        });

        assert!(matches!(result, Err(JackError::Io(_))));
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "previous\n");
        assert!(!dir.join("Main.vm.tmp").exists());
    }

    #[test]
    fn test_failed_unit_writes_nothing() {
        let dir = scratch_dir("failed");
        fs::write(dir.join("Bad.jack"), "class Bad { function void f() { let = 1; } }").unwrap();

        let result = compile_file(dir.join("Bad.jack"), &CompilerConf::default());
        assert!(matches!(result, Err(JackError::Syntax(_))));
        assert!(!dir.join("Bad.vm").exists());
    }

    #[test]
    fn test_compile_path_stops_at_first_failure() {
        let dir = scratch_dir("path");
        fs::write(dir.join("A.jack"), "class A { function int f() { return 1; } }").unwrap();
        fs::write(dir.join("B.jack"), "class B { function int f() { return y; } }").unwrap();
        fs::write(dir.join("C.jack"), "class C { function int f() { return 3; } }").unwrap();

        let result = compile_path(&dir, &CompilerConf::default());
        assert!(matches!(result, Err(JackError::Resolution(_))));
        assert!(dir.join("A.vm").exists());
        assert!(!dir.join("B.vm").exists());
        assert!(!dir.join("C.vm").exists());

        fs::write(dir.join("B.jack"), "class B { function int f() { return 2; } }").unwrap();
        let out_dir = dir.join("out");
        let conf = CompilerConf {
            output_dir: Some(out_dir.clone()),
            ..CompilerConf::default()
        };
        let outputs = compile_path(&dir, &conf).unwrap();
        assert_eq!(
            outputs,
            vec![out_dir.join("A.vm"), out_dir.join("B.vm"), out_dir.join("C.vm")]
        );
    }
}
