//! Rewriting of a single raw HTML fragment
//!
//! The fragment is parsed into a DOM, every element matching a configured
//! component is visited in definition order, and image metadata is written
//! back as JSON into the target attribute. The body is then serialized again.

use kuchikiki::traits::TendrilSink;
use kuchikiki::{ElementData, NodeDataRef, NodeRef};

use crate::adapter::ImageAdapter;
use crate::error::{ImagesError, Result};
use crate::options::{ComponentDefinition, ResolvedAttribute};
use crate::url::{is_relative_url, is_skipped_extension};

/// Processes raw HTML values for one markdown document
pub struct FragmentProcessor<'a> {
    components: &'a [ComponentDefinition],
    sharp_function: &'a str,
    adapter: ImageAdapter<'a>,
}

impl<'a> FragmentProcessor<'a> {
    pub fn new(
        components: &'a [ComponentDefinition],
        sharp_function: &'a str,
        adapter: ImageAdapter<'a>,
    ) -> Self {
        Self {
            components,
            sharp_function,
            adapter,
        }
    }

    /// Rewrite one fragment
    ///
    /// Returns `Ok(None)` when the value is empty or contains no configured
    /// component, meaning the node must be left exactly as it was. Otherwise
    /// returns the re-serialized body content, even when no attribute ended
    /// up being written.
    pub async fn process(&self, value: &str) -> Result<Option<String>> {
        if value.is_empty() {
            return Ok(None);
        }

        let document = kuchikiki::parse_html().one(value);
        let matches = self.find_components(&document)?;
        if matches.is_empty() {
            return Ok(None);
        }

        tracing::trace!(count = matches.len(), "Matched components in fragment");

        for (element, component) in &matches {
            for spec in &component.attributes {
                let attribute = spec.resolve(self.sharp_function);
                self.rewrite_attribute(element, &attribute).await?;
            }
        }

        serialize_body(&document).map(Some)
    }

    fn find_components(
        &self,
        document: &NodeRef,
    ) -> Result<Vec<(NodeDataRef<ElementData>, &'a ComponentDefinition)>> {
        let mut matches = Vec::new();
        for component in self.components {
            let selected = document
                .select(&component.tag_name)
                .map_err(|()| ImagesError::invalid_selector(&component.tag_name))?;
            matches.extend(selected.map(|element| (element, component)));
        }
        Ok(matches)
    }

    async fn rewrite_attribute(
        &self,
        element: &NodeDataRef<ElementData>,
        attribute: &ResolvedAttribute,
    ) -> Result<()> {
        // Copy out so no RefCell borrow is held across the pipeline call
        let source = element
            .attributes
            .borrow()
            .get(attribute.source.as_str())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let Some(source) = source else {
            return Ok(());
        };

        if is_skipped_extension(&source) {
            tracing::debug!(source = %source, "Skipping unsupported image type");
            return Ok(());
        }
        if !is_relative_url(&source) {
            tracing::debug!(source = %source, "Skipping non-relative image url");
            return Ok(());
        }

        let Some(result) = self
            .adapter
            .generate(&source, attribute.options_override.as_ref())
            .await?
        else {
            return Ok(());
        };

        let json = serde_json::to_string(&result)?;
        tracing::debug!(
            source = %source,
            target = %attribute.target,
            "Writing image metadata"
        );
        element
            .attributes
            .borrow_mut()
            .insert(attribute.target.as_str(), json);

        Ok(())
    }
}

/// Serialize the children of `<body>`, i.e. the fragment without the
/// document scaffolding the HTML parser adds
fn serialize_body(document: &NodeRef) -> Result<String> {
    let mut out = Vec::new();
    if let Ok(body) = document.select_first("body") {
        for child in body.as_node().children() {
            child.serialize(&mut out)?;
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}
