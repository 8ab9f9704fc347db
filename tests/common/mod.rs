//! Helpers for building small PDF files in memory.

#![allow(dead_code)]

use std::collections::HashMap;

/// Builds a PDF with one xref section whose offsets match the written objects.
#[derive(Default)]
pub struct PdfBuilder {
    objects: Vec<(u32, String)>,
    trailer: String,
    drift: HashMap<u32, i64>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id 0 obj <body> endobj`.
    pub fn object(mut self, id: u32, body: &str) -> Self {
        self.objects.push((id, body.to_string()));
        self
    }

    /// Set the trailer dictionary body, e.g. `/Root 1 0 R`.
    pub fn trailer(mut self, entries: &str) -> Self {
        self.trailer = entries.to_string();
        self
    }

    /// Record a wrong offset for `id`, shifted by `delta` bytes.
    pub fn drift(mut self, id: u32, delta: i64) -> Self {
        self.drift.insert(id, delta);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = HashMap::new();

        for (id, body) in &self.objects {
            offsets.insert(*id, out.len() as i64 + self.drift.get(id).copied().unwrap_or(0));
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
        }

        let size = self.objects.iter().map(|(id, _)| id + 1).max().unwrap_or(1);
        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
        for id in 0..size {
            let line = match offsets.get(&id) {
                Some(offset) => format!("{:010} 00000 n \n", offset),
                None => "0000000000 65535 f \n".to_string(),
            };
            out.extend_from_slice(line.as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} {} >>\nstartxref\n{}\n%%EOF\n",
                size, self.trailer, xref_offset
            )
            .as_bytes(),
        );
        out
    }
}

/// A two-page document with a media box on the page tree root only.
pub fn two_page_document() -> PdfBuilder {
    PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(
            2,
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 612 792] >>",
        )
        .object(3, "<< /Type /Page /Parent 2 0 R >>")
        .object(4, "<< /Type /Page /Parent 2 0 R /CropBox [10 10 602 782] /Rotate 90 >>")
        .trailer("/Root 1 0 R")
}

/// Position of the first occurrence of `needle` in `data`.
pub fn find(data: &[u8], needle: &str) -> usize {
    data.windows(needle.len())
        .position(|w| w == needle.as_bytes())
        .unwrap_or_else(|| panic!("'{}' not in document", needle))
}
