//! Generator module - writes document pages and listing pages

use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::config::SiteConfig;
use crate::content::Document;
use crate::helpers::{
    absolutize_urls, date_xml, escape_html, escape_xml, format_date, full_url_for, strip_html,
    strip_invalid_xml_chars, url_for,
};
use crate::index::{feed_order, paginate, SiteIndex};
use crate::report::{BuildReport, BuildWarning, WarningKind};
use crate::templates::{
    ArchiveYearData, DocumentData, LabelData, NavDocument, PaginationData, SiteData,
    TemplateRenderer,
};
use crate::Site;

/// Which label index a listing belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Tag,
    Category,
}

impl LabelKind {
    fn dir(self, config: &SiteConfig) -> &str {
        match self {
            LabelKind::Tag => &config.tag_dir,
            LabelKind::Category => &config.category_dir,
        }
    }

    fn slug(self, config: &SiteConfig, label: &str) -> String {
        match self {
            LabelKind::Tag => config.tag_slug(label),
            LabelKind::Category => config.category_slug(label),
        }
    }

    fn heading(self) -> &'static str {
        match self {
            LabelKind::Tag => "Tags",
            LabelKind::Category => "Categories",
        }
    }

    fn label_heading(self, label: &str) -> String {
        match self {
            LabelKind::Tag => format!("Tag: {}", label),
            LabelKind::Category => format!("Category: {}", label),
        }
    }

    /// Route of the label overview, e.g. `tags/`
    fn overview_route(self, config: &SiteConfig) -> String {
        format!("{}/", self.dir(config).trim_matches('/'))
    }

    /// Route of the listing for `slug`, e.g. `tags/swift/`
    fn slug_route(self, config: &SiteConfig, slug: &str) -> String {
        format!("{}{}/", self.overview_route(config), slug)
    }
}

/// Documents of every label sharing one slug, in feed order
#[derive(Debug, Default)]
struct LabelListing<'d> {
    names: Vec<&'d str>,
    docs: Vec<&'d Document>,
}

impl LabelListing<'_> {
    fn name(&self) -> String {
        self.names.join(", ")
    }
}

/// Static site generator using the built-in templates
pub struct Generator<'a> {
    site: &'a Site,
    renderer: TemplateRenderer,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Result<Self> {
        Ok(Self {
            site,
            renderer: TemplateRenderer::new()?,
        })
    }

    fn config(&self) -> &SiteConfig {
        &self.site.config
    }

    /// Generate the entire site from the built indexes
    pub fn generate(
        &self,
        index: &SiteIndex<'_>,
        assets: &[PathBuf],
        report: &mut BuildReport,
    ) -> Result<()> {
        fs::create_dir_all(&self.site.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.site.public_dir))?;

        // Assets first so generated pages win any path collision
        self.copy_assets(assets, report)?;

        let site_data = self.build_site_data();
        let tag_listings = self.label_listings(LabelKind::Tag, &index.tags);
        let category_listings = self.label_listings(LabelKind::Category, &index.categories);

        self.report_route_collisions(index, &tag_listings, &category_listings, report);

        self.generate_index_pages(index, &site_data, report)?;
        self.generate_archive_page(index, &site_data, report)?;
        self.generate_label_pages(LabelKind::Tag, &tag_listings, index, &site_data, report)?;
        self.generate_label_pages(
            LabelKind::Category,
            &category_listings,
            index,
            &site_data,
            report,
        )?;
        // Documents last: a document page replaces a listing on the same route
        self.generate_document_pages(index, &site_data, report)?;

        if self.config().feed.enable {
            self.generate_atom_feed(index, report)?;
        }

        self.generate_search_index(index, report)?;
        self.write("manifest.json", index.to_json()?, report)?;

        Ok(())
    }

    /// Build site data for templates
    fn build_site_data(&self) -> SiteData {
        let config = self.config();
        SiteData {
            title: escape_html(&config.title),
            subtitle: escape_html(&config.subtitle),
            description: escape_html(&config.description),
            author: escape_html(&config.author),
            language: config.language.clone(),
            root: url_for(config, ""),
            feed_url: url_for(config, &config.feed.path),
            archive_url: url_for(config, &format!("{}/", config.archive_dir)),
            tags_url: url_for(config, &format!("{}/", config.tag_dir)),
            categories_url: url_for(config, &format!("{}/", config.category_dir)),
        }
    }

    /// Group labels by slug so labels sharing a URL share one listing
    fn label_listings<'d>(
        &self,
        kind: LabelKind,
        labels: &'d BTreeMap<String, Vec<&Document>>,
    ) -> BTreeMap<String, LabelListing<'d>> {
        let config = self.config();
        let mut listings: BTreeMap<String, LabelListing<'d>> = BTreeMap::new();

        for (label, docs) in labels {
            let slug = kind.slug(config, label);
            if slug.is_empty() {
                tracing::warn!("Skipping {:?}: label has no URL-safe characters", label);
                continue;
            }

            let listing = listings.entry(slug).or_default();
            if !listing.names.is_empty() {
                tracing::warn!(
                    "Labels {:?} and {:?} share a URL; listing them together",
                    listing.names,
                    label
                );
            }
            listing.names.push(label.as_str());
            listing.docs.extend(docs.iter().copied());
        }

        for listing in listings.values_mut() {
            if listing.names.len() > 1 {
                listing.docs.sort_by(|a, b| feed_order(a, b));
                listing.docs.dedup_by(|a, b| a.path == b.path);
            }
        }

        listings
    }

    /// Label link for a document page; `None` when the label has no listing
    fn label_data(
        &self,
        kind: LabelKind,
        label: &str,
        docs: &BTreeMap<String, Vec<&Document>>,
    ) -> Option<LabelData> {
        let slug = kind.slug(self.config(), label);
        if slug.is_empty() {
            return None;
        }
        Some(LabelData {
            name: escape_html(label),
            url: url_for(self.config(), &kind.slug_route(self.config(), &slug)),
            count: docs.get(label).map(Vec::len).unwrap_or(0),
        })
    }

    /// Template data for one document; listings leave the content out.
    /// The description stays raw so templates can truncate before escaping.
    fn document_data(
        &self,
        doc: &Document,
        index: &SiteIndex<'_>,
        with_content: bool,
    ) -> DocumentData {
        let config = self.config();
        DocumentData {
            title: escape_html(&doc.title),
            date: format_date(&doc.date, &config.date_format),
            date_iso: date_xml(&doc.date),
            url: url_for(config, &doc.route),
            description: doc.description.clone(),
            categories: doc
                .categories
                .iter()
                .filter_map(|c| self.label_data(LabelKind::Category, c, &index.categories))
                .collect(),
            tags: doc
                .tags
                .iter()
                .filter_map(|t| self.label_data(LabelKind::Tag, t, &index.tags))
                .collect(),
            content: if with_content {
                doc.content.clone()
            } else {
                String::new()
            },
            excerpt: doc.excerpt.clone(),
        }
    }

    fn nav_document(&self, doc: &Document) -> NavDocument {
        NavDocument {
            title: escape_html(&doc.title),
            url: url_for(self.config(), &doc.route),
        }
    }

    /// Create a base context with common variables
    fn create_base_context(&self, site_data: &SiteData) -> Context {
        let mut context = Context::new();
        context.insert("site", site_data);
        context
    }

    /// Route of page `page_num` of the listing rooted at `base`
    fn page_route(&self, base: &str, page_num: usize) -> String {
        if page_num <= 1 {
            base.to_string()
        } else {
            format!("{}{}/{}/", base, self.config().pagination_dir, page_num)
        }
    }

    /// Every route a generated listing will occupy, with what lives there
    fn listing_routes<'d>(
        &self,
        index: &SiteIndex<'_>,
        tag_listings: &BTreeMap<String, LabelListing<'d>>,
        category_listings: &BTreeMap<String, LabelListing<'d>>,
    ) -> BTreeMap<String, String> {
        let config = self.config();
        let per_page = config.per_page;
        let mut routes = BTreeMap::new();

        for page_num in 1..=paginate(&index.feed, per_page).len() {
            routes.insert(
                self.page_route("", page_num),
                format!("page {} of the home listing", page_num),
            );
        }
        routes.insert(
            format!("{}/", config.archive_dir.trim_matches('/')),
            "the archive".to_string(),
        );

        for (kind, listings) in [
            (LabelKind::Tag, tag_listings),
            (LabelKind::Category, category_listings),
        ] {
            routes.insert(
                kind.overview_route(config),
                format!("the {} overview", kind.heading().to_lowercase()),
            );
            for (slug, listing) in listings {
                let base = kind.slug_route(config, slug);
                for page_num in 1..=paginate(&listing.docs, per_page).len() {
                    routes.insert(
                        self.page_route(&base, page_num),
                        format!("page {} of {}", page_num, kind.label_heading(&listing.name())),
                    );
                }
            }
        }

        routes
    }

    /// Warn about documents whose page lands on a generated listing
    fn report_route_collisions<'d>(
        &self,
        index: &SiteIndex<'_>,
        tag_listings: &BTreeMap<String, LabelListing<'d>>,
        category_listings: &BTreeMap<String, LabelListing<'d>>,
        report: &mut BuildReport,
    ) {
        let routes = self.listing_routes(index, tag_listings, category_listings);

        for doc in &index.feed {
            // A root index document replaces the home page on purpose
            if doc.route.is_empty() {
                continue;
            }
            if let Some(listing) = routes.get(&doc.route) {
                report.warn(BuildWarning {
                    path: doc.path.clone(),
                    line: None,
                    kind: WarningKind::ListingCollision {
                        route: doc.route.clone(),
                        listing: listing.clone(),
                    },
                });
            }
        }
    }

    /// Render a paginated listing of documents rooted at `base`
    fn generate_listing(
        &self,
        base: &str,
        heading: Option<&str>,
        docs: &[&Document],
        index: &SiteIndex<'_>,
        site_data: &SiteData,
        report: &mut BuildReport,
    ) -> Result<()> {
        let per_page = self.config().per_page;
        let pages = paginate(docs, per_page);
        let total = pages.len();
        let page_url = |page_num| url_for(self.config(), &self.page_route(base, page_num));

        for (i, page_docs) in pages.into_iter().enumerate() {
            let page_num = i + 1;
            let doc_data: Vec<DocumentData> = page_docs
                .iter()
                .map(|d| self.document_data(d, index, false))
                .collect();

            let pagination = PaginationData {
                per_page,
                total,
                current: page_num,
                prev_link: if page_num > 1 {
                    page_url(page_num - 1)
                } else {
                    String::new()
                },
                next_link: if page_num < total {
                    page_url(page_num + 1)
                } else {
                    String::new()
                },
            };

            let mut context = self.create_base_context(site_data);
            context.insert("heading", &heading);
            context.insert("docs", &doc_data);
            context.insert("pagination", &pagination);

            let html = self.renderer.render("listing.html", &context)?;
            self.write(
                format!("{}index.html", self.page_route(base, page_num)),
                html,
                report,
            )?;
        }

        Ok(())
    }

    /// Generate the chronological feed pages
    fn generate_index_pages(
        &self,
        index: &SiteIndex<'_>,
        site_data: &SiteData,
        report: &mut BuildReport,
    ) -> Result<()> {
        self.generate_listing("", None, &index.feed, index, site_data, report)
    }

    /// Generate individual document pages
    fn generate_document_pages(
        &self,
        index: &SiteIndex<'_>,
        site_data: &SiteData,
        report: &mut BuildReport,
    ) -> Result<()> {
        for (pos, doc) in index.feed.iter().enumerate() {
            if doc.route.is_empty() {
                tracing::info!("{} replaces the home page", doc.path);
            }

            let (prev, next) = index.neighbours(pos);

            let mut context = self.create_base_context(site_data);
            context.insert("doc", &self.document_data(doc, index, true));
            context.insert("prev", &prev.map(|d| self.nav_document(d)));
            context.insert("next", &next.map(|d| self.nav_document(d)));

            let html = self.renderer.render("document.html", &context)?;
            self.write(format!("{}index.html", doc.route), html, report)?;
        }

        tracing::info!("Generated {} document pages", index.feed.len());
        Ok(())
    }

    /// Generate archive page
    fn generate_archive_page(
        &self,
        index: &SiteIndex<'_>,
        site_data: &SiteData,
        report: &mut BuildReport,
    ) -> Result<()> {
        let years: Vec<ArchiveYearData> = index
            .archive_years()
            .map(|(year, docs)| ArchiveYearData {
                year,
                docs: docs
                    .iter()
                    .map(|d| self.document_data(d, index, false))
                    .collect(),
            })
            .collect();

        let mut context = self.create_base_context(site_data);
        context.insert("years", &years);

        let html = self.renderer.render("archive.html", &context)?;
        self.write(
            format!("{}/index.html", self.config().archive_dir.trim_matches('/')),
            html,
            report,
        )?;
        tracing::info!("Generated archive page");

        Ok(())
    }

    /// Generate the label overview and one listing per slug
    fn generate_label_pages(
        &self,
        kind: LabelKind,
        listings: &BTreeMap<String, LabelListing<'_>>,
        index: &SiteIndex<'_>,
        site_data: &SiteData,
        report: &mut BuildReport,
    ) -> Result<()> {
        let config = self.config();
        let mut overview = Vec::with_capacity(listings.len());

        for (slug, listing) in listings {
            let base = kind.slug_route(config, slug);
            let name = escape_html(&listing.name());
            let heading = kind.label_heading(&name);
            self.generate_listing(
                &base,
                Some(&heading),
                &listing.docs,
                index,
                site_data,
                report,
            )?;
            overview.push(LabelData {
                name,
                url: url_for(config, &base),
                count: listing.docs.len(),
            });
        }

        let mut context = self.create_base_context(site_data);
        context.insert("heading", kind.heading());
        context.insert("labels", &overview);

        let html = self.renderer.render("labels.html", &context)?;
        self.write(
            format!("{}index.html", kind.overview_route(config)),
            html,
            report,
        )?;

        tracing::info!(
            "Generated {} {} pages",
            overview.len(),
            kind.heading().to_lowercase()
        );
        Ok(())
    }

    /// Generate the Atom feed
    fn generate_atom_feed(&self, index: &SiteIndex<'_>, report: &mut BuildReport) -> Result<()> {
        let config = self.config();
        let base_url = config.url.trim_end_matches('/');
        let home = full_url_for(config, "");

        // Newest document date keeps the feed reproducible
        let updated = index
            .feed
            .iter()
            .map(|d| d.updated.unwrap_or(d.date))
            .max()
            .map(|d| date_xml(&d))
            .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string());

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            full_url_for(config, &config.feed.path)
        ));
        feed.push_str(&format!("  <link href=\"{}\"/>\n", home));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}</id>\n", home));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));

        for doc in index.feed.iter().take(config.feed.limit) {
            let link = full_url_for(config, &doc.route);
            feed.push_str("  <entry>\n");
            feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&doc.title)));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!("    <published>{}</published>\n", date_xml(&doc.date)));
            feed.push_str(&format!(
                "    <updated>{}</updated>\n",
                date_xml(&doc.updated.unwrap_or(doc.date))
            ));
            if let Some(description) = &doc.description {
                feed.push_str(&format!(
                    "    <summary>{}</summary>\n",
                    escape_xml(description)
                ));
            }
            for category in doc.categories.iter().chain(doc.tags.iter()) {
                feed.push_str(&format!(
                    "    <category term=\"{}\"/>\n",
                    escape_xml(category)
                ));
            }
            let content = doc.excerpt.as_ref().unwrap_or(&doc.content);
            let content = strip_invalid_xml_chars(&absolutize_urls(content, base_url));
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                content.replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");

        self.write(&config.feed.path, feed, report)?;
        tracing::info!("Generated {}", config.feed.path);

        Ok(())
    }

    /// Generate search index (JSON)
    fn generate_search_index(&self, index: &SiteIndex<'_>, report: &mut BuildReport) -> Result<()> {
        let search_data: Vec<serde_json::Value> = index
            .feed
            .iter()
            .map(|d| {
                serde_json::json!({
                    "title": d.title,
                    "slug": d.slug(),
                    "url": url_for(self.config(), &d.route),
                    "date": d.date.format("%Y-%m-%d").to_string(),
                    "description": d.description,
                    "tags": d.tags,
                    "categories": d.categories,
                    "content": strip_html(&d.content),
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&search_data)?;
        self.write("search.json", json, report)?;
        tracing::info!("Generated search.json");

        Ok(())
    }

    /// Copy static assets to the public directory
    fn copy_assets(&self, assets: &[PathBuf], report: &mut BuildReport) -> Result<()> {
        for relative in assets {
            let source = self.site.source_dir.join(relative);
            let dest = self.site.public_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::copy(&source, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", source, dest))?;
            report.assets_copied += 1;
        }

        Ok(())
    }

    /// Write one generated file below the public directory
    fn write(
        &self,
        relative: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
        report: &mut BuildReport,
    ) -> Result<()> {
        let output_path = self.site.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, contents)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        report.files_written += 1;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}
