//! Flag translator: options + paths → compiler command-line flags.
//!
//! Чистые функции без ввода-вывода. Одинаковые входные данные всегда
//! дают одинаковый результат: порядок флагов совпадает с порядком
//! ключей в [`CompilationOptions::flags`], затем идёт фиксированный хвост.

use std::path::{Path, PathBuf};

use crate::options::{CompilationOptions, OptionValue};

/// Флаг файла source map.
pub const SOURCE_MAP_FLAG: &str = "--create_source_map";

/// Флаг формата source map.
pub const SOURCE_MAP_FORMAT_FLAG: &str = "--source_map_format";

/// Флаг выходного файла.
pub const DEST_FLAG: &str = "--js_output_file";

/// Флаг исходных файлов.
pub const SRC_FLAG: &str = "--js";

/// Расширение карты, добавляемое к имени выходного файла.
pub const MAP_SUFFIX: &str = ".map";

/// Построить флаги в виде единой строки.
///
/// Это отображаемая форма: элементы [`translate_args`], разделённые
/// одним пробелом.
pub fn translate<S: AsRef<str>>(options: &CompilationOptions, src: &[S], dest: &str) -> String {
    translate_args(options, src, dest).join(" ")
}

/// Построить флаги в виде вектора аргументов.
pub fn translate_args<S: AsRef<str>>(
    options: &CompilationOptions,
    src: &[S],
    dest: &str,
) -> Vec<String> {
    let mut args = match options.active_override() {
        Some(text) => text.split_whitespace().map(str::to_string).collect(),
        None => pass_through_args(options),
    };

    args.extend(trailer_args(options, src, dest));
    args
}

/// Проходные флаги в порядке объявления.
fn pass_through_args(options: &CompilationOptions) -> Vec<String> {
    let mut args = Vec::new();

    for (key, value) in &options.flags {
        match value {
            OptionValue::Bool(true) => args.push(flag_name(key)),
            OptionValue::Bool(false) => {}
            OptionValue::Text(text) => {
                args.push(flag_name(key));
                if !text.is_empty() {
                    args.push(text.clone());
                }
            }
            // Элементы списка разбиваются по пробелам, как и `override`.
            OptionValue::List(items) => {
                args.extend(
                    items
                        .iter()
                        .flat_map(|item| item.split_whitespace())
                        .map(str::to_string),
                );
            }
        }
    }

    args
}

/// Хвост: source map, выходной файл, исходники.
fn trailer_args<S: AsRef<str>>(
    options: &CompilationOptions,
    src: &[S],
    dest: &str,
) -> Vec<String> {
    let mut args = Vec::with_capacity(src.len() + 7);

    if let Some(format) = options.source_map_format.as_deref().filter(|f| !f.is_empty()) {
        args.push(SOURCE_MAP_FORMAT_FLAG.to_string());
        args.push(format.to_string());
    }

    args.push(SOURCE_MAP_FLAG.to_string());
    args.push(map_path_for(dest));
    args.push(DEST_FLAG.to_string());
    args.push(dest.to_string());

    args.push(SRC_FLAG.to_string());
    args.extend(src.iter().map(|s| s.as_ref().to_string()));

    args
}

fn flag_name(key: &str) -> String {
    format!("--{}", key)
}

/// Путь к source map для выходного файла: `out.min.js` → `out.min.js.map`.
pub fn map_path_for(dest: &str) -> String {
    format!("{}{}", dest, MAP_SUFFIX)
}

/// То же для `Path`.
pub fn map_path(dest: &Path) -> PathBuf {
    let mut os = dest.as_os_str().to_os_string();
    os.push(MAP_SUFFIX);
    PathBuf::from(os)
}

/// Комментарий `sourceMappingURL`, ссылающийся на соседнюю карту по имени.
pub fn source_mapping_comment(dest: &Path) -> String {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("//# sourceMappingURL={}{}", name, MAP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ADVANCED, SIMPLE};

    const TRAILER: &str =
        "--create_source_map out.min.js.map --js_output_file out.min.js --js a.js b.js";

    fn sources() -> Vec<&'static str> {
        vec!["a.js", "b.js"]
    }

    #[test]
    fn test_simple_level() {
        let options = CompilationOptions::new().with_flag("compilation_level", SIMPLE);
        let flags = translate(&options, &sources(), "out.min.js");

        assert_eq!(flags, format!("--compilation_level SIMPLE {}", TRAILER));
        assert!(flags.ends_with(TRAILER));
    }

    #[test]
    fn test_override_replaces_flags() {
        let options = CompilationOptions::new()
            .with_override("--compilation_level WHITESPACE_ONLY")
            .with_flag("compilation_level", ADVANCED)
            .with_flag("angular_pass", true);

        let flags = translate(&options, &sources(), "out.min.js");
        assert_eq!(
            flags,
            format!("--compilation_level WHITESPACE_ONLY {}", TRAILER)
        );
    }

    #[test]
    fn test_blank_override_falls_back_to_flags() {
        let options = CompilationOptions::new()
            .with_override("")
            .with_flag("debug", true);

        assert_eq!(
            translate(&options, &sources(), "out.min.js"),
            format!("--debug {}", TRAILER)
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let options = CompilationOptions::new()
            .with_flag("warning_level", "VERBOSE")
            .with_flag("debug", true)
            .with_flag("externs", vec!["--externs".to_string(), "x.js".to_string()])
            .with_flag("compilation_level", ADVANCED);

        assert_eq!(
            translate(&options, &sources(), "out.min.js"),
            format!(
                "--warning_level VERBOSE --debug --externs x.js --compilation_level ADVANCED {}",
                TRAILER
            )
        );
    }

    #[test]
    fn test_false_contributes_nothing() {
        let options = CompilationOptions::new()
            .with_flag("debug", false)
            .with_flag("angular_pass", true)
            .with_flag("formatting", false);

        let flags = translate(&options, &sources(), "out.min.js");
        assert_eq!(flags, format!("--angular_pass {}", TRAILER));
        assert!(!flags.contains("  "));
        assert!(!flags.contains("--debug"));
    }

    #[test]
    fn test_only_false_options() {
        let options = CompilationOptions::new().with_flag("debug", false);
        assert_eq!(translate(&options, &sources(), "out.min.js"), TRAILER);
    }

    #[test]
    fn test_empty_values_leave_no_gaps() {
        let options = CompilationOptions::new()
            .with_flag("define", "")
            .with_flag("extra", vec![String::new(), "--jscomp_off=checkVars".into()]);

        let flags = translate(&options, &sources(), "out.min.js");
        assert_eq!(
            flags,
            format!("--define --jscomp_off=checkVars {}", TRAILER)
        );
        assert!(!flags.contains("  "));
    }

    #[test]
    fn test_translate_is_pure() {
        let options = CompilationOptions::new()
            .with_flag("compilation_level", SIMPLE)
            .with_flag("debug", true);

        let first = translate(&options, &sources(), "out.min.js");
        let second = translate(&options, &sources(), "out.min.js");
        assert_eq!(first, second);
    }

    #[test]
    fn test_paths_stay_single_arguments() {
        let options = CompilationOptions::new().with_flag("externs", "my externs.js");
        let args = translate_args(&options, &["dir with space/a.js"], "build dir/out.js");

        assert_eq!(
            args,
            vec![
                "--externs",
                "my externs.js",
                "--create_source_map",
                "build dir/out.js.map",
                "--js_output_file",
                "build dir/out.js",
                "--js",
                "dir with space/a.js",
            ]
        );
    }

    #[test]
    fn test_list_items_split_on_whitespace() {
        let options = CompilationOptions::new()
            .with_flag("externs", vec!["--externs jquery.js".to_string()])
            .with_flag("extra", vec!["  --jscomp_off  checkVars ".to_string()]);
        let args = translate_args(&options, &["a.js"], "out.js");

        assert_eq!(
            args[..5],
            ["--externs", "jquery.js", "--jscomp_off", "checkVars", "--create_source_map"]
        );
        assert_eq!(
            translate(&options, &["a.js"], "out.js"),
            args.join(" ")
        );
    }

    #[test]
    fn test_source_flag_without_sources() {
        let options = CompilationOptions::new();
        let no_sources: [&str; 0] = [];

        assert_eq!(
            translate(&options, &no_sources, "out.js"),
            "--create_source_map out.js.map --js_output_file out.js --js"
        );
    }

    #[test]
    fn test_source_map_format_in_trailer() {
        let mut options = CompilationOptions::new().with_override("--angular_pass");
        options.source_map_format = Some("V3".to_string());

        assert_eq!(
            translate(&options, &sources(), "out.min.js"),
            format!("--angular_pass --source_map_format V3 {}", TRAILER)
        );
    }

    #[test]
    fn test_map_paths() {
        assert_eq!(map_path_for("tmp/default.min.js"), "tmp/default.min.js.map");
        assert_eq!(
            map_path(Path::new("tmp/default.min.js")),
            PathBuf::from("tmp/default.min.js.map")
        );
        assert_eq!(
            source_mapping_comment(Path::new("tmp/default.min.js")),
            "//# sourceMappingURL=default.min.js.map"
        );
    }
}
