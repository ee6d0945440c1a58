//! View models and HTML rendering. Pure: no I/O, no Hyper types.

use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::sys_fileapi::core::StoredEntry;
use crate::sys_fileapi::names::{self, html_escape};
use crate::sys_pages::templates;

/// A file row on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub size_kb: u64,
    pub modified_at: String,
    pub view_url: String,
    pub delete_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    pub name: String,
    pub view_url: String,
}

pub fn view_url(raw_name: &str) -> String {
    format!("/f/{}", urlencoding::encode(raw_name))
}

pub fn delete_url(raw_name: &str) -> String {
    format!("/delete?name={}", urlencoding::encode(raw_name))
}

/// `DD.MM HH:MM` in local time.
pub fn format_modified(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format("%d.%m %H:%M").to_string()
}

/// Index rows for every non-directory entry.
pub fn uploaded_files(entries: &[StoredEntry]) -> Vec<UploadedFile> {
    entries
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| UploadedFile {
            name: e.raw_name.clone(),
            size_kb: e.size / 1024,
            modified_at: format_modified(e.modified),
            view_url: view_url(&e.raw_name),
            delete_url: delete_url(&e.raw_name),
        })
        .collect()
}

pub fn gallery_images(entries: &[StoredEntry]) -> Vec<GalleryImage> {
    entries
        .iter()
        .filter(|e| !e.is_dir && names::is_image(&e.raw_name))
        .map(|e| GalleryImage {
            name: e.raw_name.clone(),
            view_url: view_url(&e.raw_name),
        })
        .collect()
}

// ---------------------- Templates ----------------------

/// Value for a template slot.
pub enum Fragment<'a> {
    /// Escaped on output.
    Text(&'a str),
    /// Markup produced by this module, inserted as-is.
    Markup(String),
}

#[derive(Debug)]
enum Segment {
    Literal(&'static str),
    Slot(&'static str),
}

/// A page source split once into literal text and `{{SLOT}}`s.
#[derive(Debug)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &'static str) -> Self {
        let mut segments = Vec::new();
        let mut rest = source;
        while let Some(open) = rest.find("{{") {
            let Some(len) = rest[open + 2..].find("}}") else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(&rest[..open]));
            }
            segments.push(Segment::Slot(rest[open + 2..open + 2 + len].trim()));
            rest = &rest[open + 2 + len + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }
        Self { segments }
    }

    /// Fill slots by name; unknown slots render empty.
    pub fn render(&self, slots: &[(&str, Fragment<'_>)]) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => match slots.iter().find(|(slot, _)| slot == name) {
                    Some((_, Fragment::Text(text))) => out.push_str(&html_escape(text)),
                    Some((_, Fragment::Markup(html))) => out.push_str(html),
                    None => {}
                },
            }
        }
        out
    }
}

/// Pages and their row fragments, parsed once at startup and shared read-only.
#[derive(Debug)]
pub struct Pages {
    index: Template,
    gallery: Template,
    message: Template,
    file_row: Template,
    gallery_cell: Template,
}

impl Default for Pages {
    fn default() -> Self {
        Self::new()
    }
}

impl Pages {
    pub fn new() -> Self {
        Self {
            index: Template::parse(templates::INDEX_PAGE),
            gallery: Template::parse(templates::GALLERY_PAGE),
            message: Template::parse(templates::MESSAGE),
            file_row: Template::parse(templates::FILE_ROW),
            gallery_cell: Template::parse(templates::GALLERY_CELL),
        }
    }

    pub fn render_index(
        &self,
        message: Option<&str>,
        files: &[UploadedFile],
        share_url: &str,
    ) -> String {
        let message_html = match message {
            Some(msg) if !msg.is_empty() => {
                self.message.render(&[("MESSAGE", Fragment::Text(msg))])
            }
            _ => String::new(),
        };

        let count = files.len().to_string();
        self.index.render(&[
            ("SHARE_URL", Fragment::Text(share_url)),
            ("MESSAGE", Fragment::Markup(message_html)),
            ("FILE_COUNT", Fragment::Text(&count)),
            ("FILES", Fragment::Markup(self.render_file_list(files))),
        ])
    }

    pub fn render_gallery(&self, images: &[GalleryImage]) -> String {
        let cells: String = images
            .iter()
            .map(|img| {
                self.gallery_cell.render(&[
                    ("VIEW_URL", Fragment::Text(&img.view_url)),
                    ("NAME", Fragment::Text(&img.name)),
                ])
            })
            .collect();

        let empty = if images.is_empty() {
            templates::NO_IMAGES.to_string()
        } else {
            String::new()
        };

        self.gallery.render(&[
            ("IMAGES", Fragment::Markup(cells)),
            ("EMPTY", Fragment::Markup(empty)),
        ])
    }

    fn render_file_list(&self, files: &[UploadedFile]) -> String {
        if files.is_empty() {
            return templates::NO_FILES.to_string();
        }

        let mut html = String::from("<ul>");
        for f in files {
            let size_kb = f.size_kb.to_string();
            html.push_str(&self.file_row.render(&[
                ("VIEW_URL", Fragment::Text(&f.view_url)),
                ("NAME", Fragment::Text(&f.name)),
                ("SIZE_KB", Fragment::Text(&size_kb)),
                ("MODIFIED_AT", Fragment::Text(&f.modified_at)),
                ("DELETE_URL", Fragment::Text(&f.delete_url)),
            ]));
        }
        html.push_str("</ul>");
        html
    }
}
