//! Page structure: metadata, headings, DOM summary, forms and media.

use std::collections::{BTreeSet, HashMap};

use scraper::{ElementRef, Selector};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::fetch::ParsedDocument;
use crate::plugin::{Extractor, PluginLoadError, PluginOutput};
use crate::render::RenderingHandle;

const SEMANTIC_TAGS: &[&str] = &[
    "header", "nav", "main", "section", "article", "aside", "footer", "figure", "figcaption",
    "time", "mark", "details", "summary",
];

const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp", "avif"];

const MAX_LISTED: usize = 50;
const MAX_TAGS: usize = 20;
const MAX_PATTERNS: usize = 10;
const MAX_FORMS: usize = 5;

pub struct HtmlExtractor;

pub fn factory() -> Result<Box<dyn Extractor>, PluginLoadError> {
    Ok(Box::new(HtmlExtractor))
}

impl Extractor for HtmlExtractor {
    fn name(&self) -> &str {
        "html_extractor"
    }

    fn description(&self) -> &str {
        "Extracts HTML structure and DOM information"
    }

    fn extract(
        &self,
        document: &ParsedDocument,
        _live: Option<&dyn RenderingHandle>,
        url: &str,
    ) -> anyhow::Result<PluginOutput> {
        let mut output = PluginOutput::new();
        output.insert("title".into(), json!(document.first_text("title").unwrap_or_default()));
        output.insert("meta_description".into(), json!(meta_description(document)));
        output.insert(
            "meta_keywords".into(),
            json!(meta_content(document, r#"meta[name="keywords"]"#).unwrap_or_default()),
        );
        output.insert("open_graph".into(), Value::Object(open_graph(document)));
        output.insert("headings".into(), headings(document));
        output.insert("dom_structure".into(), dom_structure(document));
        output.insert("semantic_elements".into(), Value::Object(semantic_elements(document)));
        output.insert("links".into(), links(document, url));
        output.insert("forms".into(), forms(document));
        output.insert("media".into(), media(document));
        Ok(output)
    }
}

fn within<'a>(element: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    Selector::parse(selector)
        .map(|parsed| element.select(&parsed).collect())
        .unwrap_or_default()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn meta_content(document: &ParsedDocument, selector: &str) -> Option<String> {
    document
        .select(selector)
        .first()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
}

fn meta_description(document: &ParsedDocument) -> String {
    meta_content(document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
        .unwrap_or_default()
}

fn open_graph(document: &ParsedDocument) -> Map<String, Value> {
    document
        .select(r#"meta[property^="og:"]"#)
        .into_iter()
        .filter_map(|meta| {
            let property = meta.value().attr("property")?;
            let content = meta.value().attr("content").filter(|c| !c.is_empty())?;
            Some((property.to_string(), json!(content)))
        })
        .collect()
}

/// One node of the heading outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
    pub children: Vec<Heading>,
}

fn headings(document: &ParsedDocument) -> Value {
    let mut by_level = Map::new();
    let mut flat = Vec::new();

    for element in document.select("h1, h2, h3, h4, h5, h6") {
        let text = text_of(element);
        if text.is_empty() {
            continue;
        }
        let level = element.value().name()[1..].parse::<u8>().unwrap_or(1);
        let id = element.value().id().unwrap_or_default().to_string();
        let classes: Vec<&str> = element.value().classes().collect();

        if let Value::Array(entries) = by_level
            .entry(format!("h{level}"))
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            entries.push(json!({ "text": text, "id": id, "class": classes }));
        }
        flat.push(Heading {
            level,
            text,
            id,
            children: Vec::new(),
        });
    }

    for level in 1..=6 {
        by_level
            .entry(format!("h{level}"))
            .or_insert_with(|| Value::Array(Vec::new()));
    }

    let mut position = 0;
    by_level.insert("hierarchy".into(), json!(outline(&flat, &mut position, 0)));
    Value::Object(by_level)
}

/// Nest headings under the closest preceding heading of a lower level.
pub fn outline(flat: &[Heading], position: &mut usize, parent_level: u8) -> Vec<Heading> {
    let mut nodes = Vec::new();
    while let Some(heading) = flat.get(*position) {
        if heading.level <= parent_level {
            break;
        }
        *position += 1;
        let mut node = heading.clone();
        node.children = outline(flat, position, heading.level);
        nodes.push(node);
    }
    nodes
}

fn dom_structure(document: &ParsedDocument) -> Value {
    let elements = document.select("*");

    let mut classes = BTreeSet::new();
    let mut ids = BTreeSet::new();
    let mut tags: HashMap<&str, usize> = HashMap::new();
    let mut max_depth = 0;

    for element in &elements {
        classes.extend(element.value().classes());
        ids.extend(element.value().id());
        *tags.entry(element.value().name()).or_default() += 1;

        let depth = element.ancestors().filter(|node| node.value().is_element()).count() + 1;
        max_depth = max_depth.max(depth);
    }

    let mut distribution: Vec<(&str, usize)> = tags.into_iter().collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    distribution.truncate(MAX_TAGS);

    let mut prefixes: HashMap<&str, usize> = HashMap::new();
    for class in &classes {
        if let Some((prefix, _)) = class.split_once('-') {
            *prefixes.entry(prefix).or_default() += 1;
        }
    }
    let mut patterns: Vec<(&str, usize)> = prefixes.into_iter().collect();
    patterns.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    json!({
        "total_elements": elements.len(),
        "max_depth": max_depth,
        "unique_classes": classes.iter().take(MAX_LISTED).collect::<Vec<_>>(),
        "unique_ids": ids.iter().take(MAX_LISTED).collect::<Vec<_>>(),
        "class_count": classes.len(),
        "id_count": ids.len(),
        "tag_distribution": distribution
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), json!(count)))
            .collect::<Map<_, _>>(),
        "common_patterns": patterns
            .into_iter()
            .take(MAX_PATTERNS)
            .map(|(prefix, _)| prefix)
            .collect::<Vec<_>>(),
    })
}

fn semantic_elements(document: &ParsedDocument) -> Map<String, Value> {
    SEMANTIC_TAGS
        .iter()
        .filter_map(|tag| {
            let count = document.select(tag).len();
            (count > 0).then(|| ((*tag).to_string(), json!(count)))
        })
        .collect()
}

fn links(document: &ParsedDocument, url: &str) -> Value {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|base| base.host_str().map(str::to_string));
    let hrefs: Vec<&str> = document
        .select("a[href]")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .collect();
    let external = hrefs
        .iter()
        .filter_map(|href| url::Url::parse(href).ok())
        .filter(|target| target.host_str().map(str::to_string) != host)
        .count();

    json!({ "total": hrefs.len(), "external": external })
}

fn forms(document: &ParsedDocument) -> Value {
    let all = document.select("form");
    let summaries: Vec<Value> = all
        .iter()
        .take(MAX_FORMS)
        .map(|form| {
            let inputs = within(*form, "input, select, textarea, button");
            let mut input_types: HashMap<String, usize> = HashMap::new();
            for input in &inputs {
                let kind = input
                    .value()
                    .attr("type")
                    .unwrap_or_else(|| input.value().name());
                *input_types.entry(kind.to_string()).or_default() += 1;
            }
            json!({
                "method": form.value().attr("method").unwrap_or("GET").to_uppercase(),
                "action": form.value().attr("action").unwrap_or_default(),
                "input_count": inputs.len(),
                "input_types": input_types,
                "has_validation": !within(*form, "[required]").is_empty(),
            })
        })
        .collect();

    json!({ "form_count": all.len(), "forms": summaries })
}

fn media(document: &ParsedDocument) -> Value {
    let images = document.select("img");
    let mut formats: HashMap<String, usize> = HashMap::new();
    for image in images.iter().take(MAX_TAGS) {
        let src = image.value().attr("src").unwrap_or_default();
        let path = src.split(['?', '#']).next().unwrap_or_default();
        if let Some((_, extension)) = path.rsplit_once('.') {
            let extension = extension.to_ascii_lowercase();
            if IMAGE_FORMATS.contains(&extension.as_str()) {
                *formats.entry(extension).or_default() += 1;
            }
        }
    }

    let attr_count = |name: &str, wanted: Option<&str>| {
        images
            .iter()
            .filter(|image| match (image.value().attr(name), wanted) {
                (Some(value), Some(wanted)) => value == wanted,
                (Some(value), None) => !value.is_empty(),
                (None, _) => false,
            })
            .count()
    };

    json!({
        "images": {
            "total": images.len(),
            "with_alt": attr_count("alt", None),
            "with_loading_lazy": attr_count("loading", Some("lazy")),
            "formats": formats,
        },
        "videos": document.select("video").len(),
        "audios": document.select("audio").len(),
        "has_responsive_images": !document.select("picture, img[srcset]").is_empty(),
    })
}
