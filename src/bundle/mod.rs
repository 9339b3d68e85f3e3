//! Bundle text format
//!
//! A bundle is the concatenation of one self-registering wrapper per source
//! file followed by one trailer:
//!
//! ```text
//! registerModule("pkg", "pkg/lib/util", ["dep"], function (require, exports, module) {
//!     exports.answer = 42;
//! });
//! definePackage("pkg", "pkg/pkg", ["dep"]);
//! ```
//!
//! Arguments are JSON literals. Module bodies are indented by [`INDENT`], so
//! a closing `});` at column zero always ends the current module. The
//! publisher writes this format and the runtime loader parses it back.

use serde::{Deserialize, Serialize};

use crate::error::{GrindError, Result};

/// Margin added in front of every source line
pub const INDENT: &str = "    ";

const REGISTER_CALL: &str = "registerModule(";
const FACTORY_HEAD: &str = ", function (require, exports, module) {";
const MODULE_END: &str = "});";
const DEFINE_CALL: &str = "definePackage(";
const CALL_END: &str = ");";

/// Values bound into one module wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleWrapper {
    pub package_name: String,
    pub module_path: String,
    pub dependencies: Vec<String>,
    /// Source text, already indented
    pub code: String,
}

/// Values bound into the bundle trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleTrailer {
    pub package_name: String,
    pub main_module: Option<String>,
    pub dependencies: Vec<String>,
}

/// One module recovered from bundle text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub package_name: String,
    /// Full module path, package name included
    pub module_path: String,
    pub dependencies: Vec<String>,
    /// Source text with the indentation removed
    pub code: String,
}

/// Everything a bundle declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBundle {
    pub modules: Vec<ModuleSource>,
    pub trailer: Option<BundleTrailer>,
}

/// Indent every line of `source` by [`INDENT`]
pub fn indent(source: &str) -> String {
    source
        .split('\n')
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn json<T: Serialize + ?Sized>(value: &T, template: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| GrindError::Render {
        template: template.to_string(),
        reason: e.to_string(),
    })
}

/// Render one module wrapper
pub fn render_module(wrapper: &ModuleWrapper) -> Result<String> {
    Ok(format!(
        "{REGISTER_CALL}{}, {}, {}{FACTORY_HEAD}\n{}\n{MODULE_END}\n",
        json(&wrapper.package_name, "module")?,
        json(&wrapper.module_path, "module")?,
        json(&wrapper.dependencies, "module")?,
        wrapper.code
    ))
}

/// Render the bundle trailer
pub fn render_trailer(trailer: &BundleTrailer) -> Result<String> {
    Ok(format!(
        "{DEFINE_CALL}{}, {}, {}{CALL_END}\n",
        json(&trailer.package_name, "trailer")?,
        json(&trailer.main_module, "trailer")?,
        json(&trailer.dependencies, "trailer")?
    ))
}

/// Parse bundle text back into its modules and trailer
pub fn parse(text: &str) -> Result<ParsedBundle> {
    let mut bundle = ParsedBundle::default();
    let mut open: Option<(usize, ModuleSource, Vec<&str>)> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if open.is_some() {
            if line == MODULE_END {
                if let Some((_, mut module, body)) = open.take() {
                    module.code = body.join("\n");
                    bundle.modules.push(module);
                }
                continue;
            }
            let stripped = if line.is_empty() {
                ""
            } else {
                line.strip_prefix(INDENT)
                    .ok_or_else(|| malformed(line_no, "module body line is not indented"))?
            };
            if let Some((_, _, body)) = open.as_mut() {
                body.push(stripped);
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        if let Some(args) = line
            .strip_prefix(REGISTER_CALL)
            .and_then(|rest| rest.strip_suffix(FACTORY_HEAD))
        {
            let (package_name, module_path, dependencies): (String, String, Vec<String>) =
                parse_args(args, line_no)?;
            let module = ModuleSource {
                package_name,
                module_path,
                dependencies,
                code: String::new(),
            };
            open = Some((line_no, module, Vec::new()));
        } else if let Some(args) = line
            .strip_prefix(DEFINE_CALL)
            .and_then(|rest| rest.strip_suffix(CALL_END))
        {
            let (package_name, main_module, dependencies) = parse_args(args, line_no)?;
            bundle.trailer = Some(BundleTrailer {
                package_name,
                main_module,
                dependencies,
            });
        } else {
            return Err(malformed(line_no, "expected registerModule or definePackage"));
        }
    }

    if let Some((start, module, _)) = open {
        return Err(malformed(
            start,
            format!("module {} is never closed", module.module_path),
        ));
    }
    Ok(bundle)
}

fn parse_args<T: serde::de::DeserializeOwned>(args: &str, line: usize) -> Result<T> {
    serde_json::from_str(&format!("[{args}]")).map_err(|e| malformed(line, e))
}

fn malformed(line: usize, reason: impl std::fmt::Display) -> GrindError {
    GrindError::BundleParse {
        line,
        reason: reason.to_string(),
    }
}
