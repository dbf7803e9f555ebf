use courseflow_core::{Course, FlowRef, Page};

use crate::video::{ResourceLink, VideoPage};

/// Indent every line after the first by `width` spaces, the way block text
/// is embedded in the generated documents.
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    let mut lines = text.lines();
    let mut out = String::with_capacity(text.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}

/// One per-module flow document: title, optional description, access rules
/// and the ordered page list. Bit-reproducible given identical inputs.
pub fn render_flow_document(title: &str, description: Option<&str>, pages: &[Page]) -> String {
    let mut out = String::new();
    out.push_str(&format!("title: \"{title}\"\n"));
    out.push_str("description: |\n");
    if let Some(description) = description {
        out.push_str("    <div class=\"well\">\n");
        out.push_str("    ");
        out.push_str(&indent(description, 4));
        out.push('\n');
        out.push_str("    </div>\n");
    }
    out.push('\n');
    out.push_str("rules:\n");
    out.push_str("    access:\n");
    out.push_str("    -\n");
    out.push_str("        if_has_role: [student, ta, instructor]\n");
    out.push_str("        permissions: [view]\n");
    out.push('\n');
    out.push_str("    grade_identifier: null\n");
    out.push('\n');
    out.push_str("pages:\n");
    out.push('\n');
    for page in pages {
        out.push_str("-\n");
        out.push_str("    type: Page\n");
        out.push_str(&format!("    id: {}\n", page.id));
        out.push_str("    content: |\n");
        out.push_str(&format!("        # {}\n", page.title));
        out.push('\n');
        out.push_str("        ");
        out.push_str(&indent(&page.content, 8));
        out.push('\n');
        out.push('\n');
    }
    out
}

/// The `<video>` embed with one `<track>` per subtitle.
pub fn render_video_embed(video: &VideoPage) -> String {
    let mut out = String::new();
    out.push_str(
        "<video class=\"video-js vjs-default-skin vjs-fluid vjs-big-play-centered\" \
         controls preload=\"none\" data-setup='[]' playsinline>\n",
    );
    out.push_str(&format!(
        "  <source src='{}' type='video/mp4' />\n",
        video.url
    ));
    for subtitle in &video.subtitles {
        out.push_str(&format!(
            "  <track kind='captions' src='{}' srclang='{}' label='{}'{} />\n",
            subtitle.url,
            subtitle.lang,
            subtitle.label,
            if subtitle.is_default { " default" } else { "" },
        ));
    }
    out.push_str("</video>\n");
    out
}

/// The downloadable-resources list appended to a lecture page. PDF assets
/// go through the platform's viewer macro; everything else is a plain
/// download link.
pub fn render_resource_section(links: &[ResourceLink]) -> String {
    let mut out = String::new();
    out.push_str("<hr>\n");
    out.push('\n');
    out.push_str("{% from \"macros.jinja\" import downloadviewpdf %}\n");
    out.push('\n');
    out.push_str("<h3>Resources</h3>\n");
    out.push_str("<ul>\n");
    for link in links {
        if link.is_pdf() {
            out.push_str(&format!(
                "  <li>{{{{ downloadviewpdf(\"{}\", \"{}\") }}}}</li>\n",
                link.url, link.file_name
            ));
        } else {
            out.push_str(&format!(
                "  <li>{}: <a href=\"{}\" target=\"_blank\" download=\"{}\">{}</a></li>\n",
                link.asset_type, link.url, link.file_name, link.name
            ));
        }
    }
    out.push_str("</ul>\n");
    out
}

/// The two layouts the course manifest is generated in. Both derive from
/// the same flow list and stay structurally consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestLayout {
    /// A chunk fragment embedded in a larger composite document.
    Embedded,
    /// A free-standing table-of-contents document.
    Standalone,
}

pub fn render_course_manifest(course: &Course, flows: &[FlowRef], layout: ManifestLayout) -> String {
    match layout {
        ManifestLayout::Embedded => render_manifest_embedded(course, flows),
        ManifestLayout::Standalone => render_manifest_standalone(course, flows),
    }
}

fn render_manifest_embedded(course: &Course, flows: &[FlowRef]) -> String {
    let mut out = String::new();
    out.push_str("-\n");
    out.push_str(&format!("    title: \"Course: {}\"\n", course.name));
    out.push_str(&format!("    id: {}\n", course.slug));
    out.push_str("    collapsible: True\n");
    out.push('\n');
    out.push_str("    content: |\n");
    out.push_str(&format!("        ## {}\n", course.name));
    out.push('\n');
    out.push_str("        {% from \"macros.jinja\" import accordion, button, file %}\n");
    out.push('\n');
    for (index, flow) in flows.iter().enumerate() {
        out.push_str(&module_heading(index + 1, flow, 8));
        out.push('\n');
        if let Some(description) = flow.description.as_deref() {
            out.push_str("        ");
            out.push_str(&indent(description, 8));
            out.push('\n');
            out.push('\n');
        }
        out.push_str("        <hr>\n");
        out.push('\n');
    }
    out
}

fn render_manifest_standalone(course: &Course, flows: &[FlowRef]) -> String {
    let mut out = String::new();
    out.push_str("chunks:\n");
    out.push('\n');
    out.push_str("-\n");
    out.push_str(&format!("    title: \"{}\"\n", course.name));
    out.push_str("    id: toc\n");
    out.push_str("    content: |\n");
    out.push('\n');
    let underscored = course.slug.replace('-', "_");
    for (index, flow) in flows.iter().enumerate() {
        let ordinal = index + 1;
        out.push_str("-\n");
        out.push_str(&format!(
            "    title: \"Module {}: {}\"\n",
            ordinal, flow.name
        ));
        out.push_str(&format!("    id: {underscored}_module_{ordinal}\n"));
        out.push_str("    collapsible: True\n");
        out.push('\n');
        out.push_str("    content: |\n");
        out.push_str("        {% from \"macros.jinja\" import accordion, button, file %}\n");
        out.push('\n');
        out.push_str(&module_heading(ordinal, flow, 8));
        out.push('\n');
        if let Some(description) = flow.description.as_deref() {
            out.push_str("        ");
            out.push_str(&indent(description, 8));
            out.push('\n');
            out.push('\n');
        }
        out.push_str("        <hr>\n");
        out.push('\n');
    }
    out
}

fn module_heading(ordinal: usize, flow: &FlowRef, width: usize) -> String {
    format!(
        "{pad}#### Module {ordinal}: {name} {{{{ button(\"flow:{id}\") }}}}\n",
        pad = " ".repeat(width),
        name = flow.name,
        id = flow.flow_id,
    )
}
