//! Text rendering service used by the publisher
//!
//! The publisher never formats output itself; it hands a template name and a
//! JSON context to a [`Renderer`]. [`BuiltinTemplates`] renders the three
//! templates the pipeline needs: `module`, `trailer` and `loader`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bundle::{self, BundleTrailer, ModuleWrapper};
use crate::error::{GrindError, Result};

pub const MODULE_TEMPLATE: &str = "module";
pub const TRAILER_TEMPLATE: &str = "trailer";
pub const LOADER_TEMPLATE: &str = "loader";

/// `render(name, context) -> text`
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, context: &Value) -> Result<String>;
}

/// Values bound into the standalone HTML loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderPage {
    /// Package started by the page
    pub main: String,
    /// Runtime support file, relative to the page
    pub runtime: String,
    pub jquery: Option<String>,
    /// Bundles of the package and all its dependencies
    pub bundles: Vec<String>,
    pub css: Vec<String>,
}

/// Built-in templates matching the bundle format the runtime loader parses
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl Renderer for BuiltinTemplates {
    fn render(&self, name: &str, context: &Value) -> Result<String> {
        match name {
            MODULE_TEMPLATE => bundle::render_module(&context_as::<ModuleWrapper>(name, context)?),
            TRAILER_TEMPLATE => bundle::render_trailer(&context_as::<BundleTrailer>(name, context)?),
            LOADER_TEMPLATE => Ok(render_loader_page(&context_as::<LoaderPage>(name, context)?)),
            _ => Err(GrindError::Render {
                template: name.to_string(),
                reason: "unknown template".to_string(),
            }),
        }
    }
}

/// Serialize a typed context for a [`Renderer`]
pub fn to_context<T: Serialize>(name: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| render_error(name, e))
}

fn context_as<T: serde::de::DeserializeOwned>(name: &str, context: &Value) -> Result<T> {
    T::deserialize(context).map_err(|e| render_error(name, e))
}

fn render_error(name: &str, err: impl std::fmt::Display) -> GrindError {
    GrindError::Render {
        template: name.to_string(),
        reason: err.to_string(),
    }
}

fn render_loader_page(page: &LoaderPage) -> String {
    let mut head = String::new();
    for css in &page.css {
        head.push_str(&format!(
            "    <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">\n",
            escape_html(css)
        ));
    }
    if let Some(jquery) = &page.jquery {
        head.push_str(&script_tag(jquery));
    }
    head.push_str(&script_tag(&page.runtime));
    for bundle in &page.bundles {
        head.push_str(&script_tag(bundle));
    }

    let main = serde_json::to_string(&page.main).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         \x20   <meta charset=\"utf-8\">\n\
         \x20   <title>{title}</title>\n\
         {head}\
         </head>\n\
         <body>\n\
         \x20   <script type=\"text/javascript\">\n\
         \x20       grindstone.start({main});\n\
         \x20   </script>\n\
         </body>\n\
         </html>\n",
        title = escape_html(&page.main),
    )
}

fn script_tag(src: &str) -> String {
    format!(
        "    <script type=\"text/javascript\" src=\"{}\"></script>\n",
        escape_html(src)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
