//! NIHMS bulk submission metadata (`bulk_meta.xml`).

use std::io::Write;
use std::sync::Arc;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use nihms_model::{Journal, Manuscript, Metadata, Person};

use crate::document::DocumentSerializer;
use crate::error::{AssembleError, Result};

/// Entry name of the metadata document inside the package.
pub const BULK_META_NAME: &str = "bulk_meta.xml";

/// Mime type of the metadata document.
pub const BULK_META_MIME_TYPE: &str = "application/xml";

const DOCTYPE: &str = "<!DOCTYPE nihms-submit SYSTEM \"bulksubmission.dtd\">\n";

/// Renders submission [`Metadata`] into `bulk_meta.xml`.
#[derive(Debug, Clone)]
pub struct MetadataSerializer {
    metadata: Arc<Metadata>,
}

impl MetadataSerializer {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
        }
    }
}

impl DocumentSerializer for MetadataSerializer {
    fn name(&self) -> &str {
        BULK_META_NAME
    }

    fn mime_type(&self) -> &str {
        BULK_META_MIME_TYPE
    }

    fn render(&self) -> Result<Vec<u8>> {
        let metadata = self.metadata.as_ref();
        if metadata.manuscript.title.trim().is_empty() {
            return Err(missing("manuscript.title"));
        }

        let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml.get_mut().write_all(b"\n")?;
        xml.get_mut().write_all(DOCTYPE.as_bytes())?;

        xml.write_event(Event::Start(BytesStart::new("nihms-submit")))?;
        if let Some(journal) = &metadata.journal {
            write_journal(&mut xml, journal)?;
        }
        write_text_element(&mut xml, "manuscript-title", metadata.manuscript.title.trim())?;
        write_manuscript(&mut xml, &metadata.manuscript)?;
        write_contacts(&mut xml, &metadata.persons)?;
        write_grants(&mut xml, metadata)?;
        xml.write_event(Event::End(BytesEnd::new("nihms-submit")))?;

        let mut bytes = xml.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn missing(field: impl Into<String>) -> AssembleError {
    AssembleError::MissingMetadata {
        field: field.into(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn write_text_element<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_journal<W: Write>(xml: &mut Writer<W>, journal: &Journal) -> Result<()> {
    if journal.title.trim().is_empty() {
        return Err(missing("journal.title"));
    }
    xml.write_event(Event::Start(BytesStart::new("journal-meta")))?;
    if let Some(nlm_ta) = journal.nlm_ta.as_deref().filter(|v| !v.trim().is_empty()) {
        let mut id = BytesStart::new("journal-id");
        id.push_attribute(("journal-id-type", "nlm-ta"));
        xml.write_event(Event::Start(id))?;
        xml.write_event(Event::Text(BytesText::new(nlm_ta.trim())))?;
        xml.write_event(Event::End(BytesEnd::new("journal-id")))?;
    }
    for issn in &journal.issns {
        let mut element = BytesStart::new("issn");
        element.push_attribute(("issn-type", issn.pub_type.as_str()));
        xml.write_event(Event::Start(element))?;
        xml.write_event(Event::Text(BytesText::new(issn.value.trim())))?;
        xml.write_event(Event::End(BytesEnd::new("issn")))?;
    }
    write_text_element(xml, "journal-title", journal.title.trim())?;
    xml.write_event(Event::End(BytesEnd::new("journal-meta")))?;
    Ok(())
}

fn write_manuscript<W: Write>(xml: &mut Writer<W>, manuscript: &Manuscript) -> Result<()> {
    let mut element = BytesStart::new("manuscript-meta");
    element.push_attribute(("publisher_pdf", yes_no(manuscript.publisher_pdf)));
    element.push_attribute(("show_publisher_pdf", yes_no(manuscript.show_publisher_pdf)));
    let embargo = manuscript.embargo_months.map(|months| months.to_string());
    if let Some(embargo) = &embargo {
        element.push_attribute(("embargo", embargo.as_str()));
    }
    if let Some(id) = manuscript.nihms_id.as_deref() {
        element.push_attribute(("id", id));
    }

    let url = manuscript.manuscript_url.as_deref();
    let doi = manuscript.doi.as_deref();
    if url.is_none() && doi.is_none() {
        xml.write_event(Event::Empty(element))?;
        return Ok(());
    }
    xml.write_event(Event::Start(element))?;
    if let Some(url) = url {
        let mut link = BytesStart::new("manuscript_url");
        link.push_attribute(("href", url));
        xml.write_event(Event::Empty(link))?;
    }
    if let Some(doi) = doi {
        write_text_element(xml, "doi", doi)?;
    }
    xml.write_event(Event::End(BytesEnd::new("manuscript-meta")))?;
    Ok(())
}

fn write_contacts<W: Write>(xml: &mut Writer<W>, persons: &[Person]) -> Result<()> {
    if persons.is_empty() {
        return Ok(());
    }
    xml.write_event(Event::Start(BytesStart::new("contacts")))?;
    for (index, person) in persons.iter().enumerate() {
        if person.last_name.trim().is_empty() {
            return Err(missing(format!("persons[{index}].last_name")));
        }
        let mut element = BytesStart::new("person");
        element.push_attribute(("fname", person.first_name.trim()));
        if let Some(middle) = person.middle_name.as_deref().filter(|v| !v.trim().is_empty()) {
            element.push_attribute(("mname", middle.trim()));
        }
        element.push_attribute(("lname", person.last_name.trim()));
        if let Some(email) = person.email.as_deref().filter(|v| !v.trim().is_empty()) {
            element.push_attribute(("email", email.trim()));
        }
        element.push_attribute(("person-type", person.role.as_str()));
        element.push_attribute(("corrpi", yes_no(person.corresponding)));
        xml.write_event(Event::Empty(element))?;
    }
    xml.write_event(Event::End(BytesEnd::new("contacts")))?;
    Ok(())
}

fn write_grants<W: Write>(xml: &mut Writer<W>, metadata: &Metadata) -> Result<()> {
    if metadata.grants.is_empty() {
        return Ok(());
    }
    xml.write_event(Event::Start(BytesStart::new("grants")))?;
    for grant in &metadata.grants {
        let mut element = BytesStart::new("grant");
        element.push_attribute(("funder", grant.funder.as_str()));
        element.push_attribute(("id", grant.grant_id.as_str()));
        xml.write_event(Event::Empty(element))?;
    }
    xml.write_event(Event::End(BytesEnd::new("grants")))?;
    Ok(())
}
