use crate::markup::{Emphasis, EmphasisOptions};

use super::element::{DivisionType, ElementKind, is_division_tag};
use super::inline::InlineRenderer;
use super::run::EcfrConverter;
use super::walker::{ContextStack, HierarchyWalker, WalkState, format_section_number};

fn render(xml: &str) -> (String, WalkState) {
    let doc = roxmltree::Document::parse(xml).expect("fixture parses");
    let inline = InlineRenderer::new().expect("inline regexes compile");
    let emphasis = Emphasis::new(EmphasisOptions::default()).expect("emphasis compiles");
    let walker = HierarchyWalker::new(&inline, &emphasis);

    let mut state = WalkState::default();
    let output = walker.render_division(doc.root_element(), &mut state);
    (output, state)
}

fn inline_text(xml: &str) -> String {
    let doc = roxmltree::Document::parse(xml).expect("fixture parses");
    let inline = InlineRenderer::new().expect("inline regexes compile");
    inline.text(doc.root_element())
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing {needle:?} in:\n{haystack}"))
}

#[test]
fn bare_section_number_gets_symbol_at_deepest_level() {
    let (output, state) = render(r#"<DIV8 N="101.10" TYPE="SECTION"><HEAD>101.10</HEAD></DIV8>"#);

    assert_eq!(output, "\n###### § 101.10\n");
    assert!(output.lines().any(|line| line == "###### § 101.10"));
    assert_eq!(state.stats.sections, 1);
    assert_eq!(state.context.section, "101.10");
}

#[test]
fn section_number_formatting_adds_symbol_once() {
    assert_eq!(format_section_number("§ 101.10 Purpose."), "§ 101.10 Purpose.");
    assert_eq!(format_section_number("101.10 Purpose."), "§ 101.10 Purpose.");
    assert_eq!(format_section_number("101.10-1"), "§ 101.10-1");
    assert_eq!(format_section_number("§§ 101.1-101.5"), "§§ 101.1-101.5");
    assert_eq!(format_section_number("Appendix A"), "Appendix A");
    assert_eq!(format_section_number("..."), "...");
}

#[test]
fn blocks_follow_heading_auxiliary_paragraph_child_order() {
    let xml = r#"<DIV5 N="101" TYPE="PART">
        <P>Part intro applies.</P>
        <EDNOTE><HED>Editorial Note:</HED><PSPACE>Nomenclature changes appear at 70 FR 1.</PSPACE></EDNOTE>
        <SOURCE><HED>Source:</HED><PSPACE>CGD 04-022, 70 FR 1234.</PSPACE></SOURCE>
        <HEAD>PART 101—GENERAL</HEAD>
        <AUTH><HED>Authority:</HED><PSPACE>46 USC 3306.</PSPACE></AUTH>
        <DIV8 N="101.1" TYPE="SECTION">
            <HEAD>§ 101.1 Purpose.</HEAD>
            <CITA>[CGD 95-028, 62 FR 51194]</CITA>
            <P>Vessels shall comply.</P>
        </DIV8>
    </DIV5>"#;

    let (output, state) = render(xml);

    let heading = position(&output, "#### PART 101—GENERAL");
    let authority = position(&output, "**Authority:**\n46 USC 3306.");
    let source = position(&output, "**Source:**\nCGD 04-022, 70 FR 1234.");
    let note = position(&output, "**Editorial Note:**\nNomenclature changes appear at 70 FR 1.");
    let paragraph = position(&output, "Part intro applies.");
    let child = position(&output, "###### § 101.1 Purpose.");
    let child_paragraph = position(&output, "Vessels **shall** comply.");
    let citation = position(&output, "*[CGD 95-028, 62 FR 51194]*");

    assert!(heading < authority);
    assert!(authority < source);
    assert!(source < note);
    assert!(note < paragraph);
    assert!(paragraph < child);
    assert!(child < child_paragraph);
    assert!(child_paragraph < citation);

    assert_eq!(state.stats.divisions, 2);
    assert_eq!(state.stats.auxiliary_blocks, 3);
    assert_eq!(state.stats.paragraphs, 2);
    assert_eq!(state.stats.citations, 1);
}

#[test]
fn auxiliary_block_renders_label_then_body_lines() {
    let xml = r#"<DIV5 TYPE="PART"><AUTH><HED>Authority:</HED><PSPACE>46 USC 2103;</PSPACE><P>33 CFR 1.05-1.</P></AUTH></DIV5>"#;
    let (output, _) = render(xml);
    assert_eq!(output, "\n**Authority:**\n46 USC 2103;\n33 CFR 1.05-1.\n");
}

#[test]
fn missing_optional_children_are_omitted() {
    let (output, state) = render(r#"<DIV6 TYPE="SUBPART"><P>Only text.</P></DIV6>"#);
    assert_eq!(output, "\nOnly text.\n");
    assert_eq!(state.context, ContextStack::default());
}

#[test]
fn same_tag_children_are_not_recursed() {
    let xml = r#"<DIV5 TYPE="PART"><HEAD>PART 1</HEAD><DIV5 TYPE="PART"><HEAD>PART 2</HEAD></DIV5></DIV5>"#;
    let (output, state) = render(xml);
    assert!(output.contains("#### PART 1"));
    assert!(!output.contains("PART 2"));
    assert_eq!(state.stats.divisions, 1);
}

#[test]
fn unknown_division_type_falls_back_to_deepest_level() {
    let xml = r#"<DIV7 TYPE="SUBJGRP"><HEAD>Lifesaving Equipment</HEAD></DIV7>"#;
    let (output, state) = render(xml);
    assert_eq!(output, "\n###### Lifesaving Equipment\n");
    assert!(state.stats.unknown_division_types.contains("SUBJGRP"));
}

#[test]
fn division_types_map_to_levels() {
    let levels = ["TITLE", "CHAPTER", "SUBCHAP", "PART", "SUBPART", "SECTION", "APPENDIX"]
        .iter()
        .map(|raw| DivisionType::parse(raw).heading_level().get())
        .collect::<Vec<u8>>();
    assert_eq!(levels, vec![1, 2, 3, 4, 5, 6, 6]);
    assert_eq!(DivisionType::parse("section"), DivisionType::Section);
}

#[test]
fn element_kinds_classify_tags() {
    let doc = roxmltree::Document::parse(
        r#"<DIV9 TYPE="SECTION"><HEAD/><P/><AUTH/><SOURCE/><EDNOTE/><CITA/><GPOTABLE/></DIV9>"#,
    )
    .expect("fixture parses");
    let root = doc.root_element();

    assert_eq!(
        ElementKind::of(root),
        ElementKind::Division(DivisionType::Section)
    );
    let kinds = root.children().map(ElementKind::of).collect::<Vec<ElementKind>>();
    assert_eq!(
        kinds,
        vec![
            ElementKind::Heading,
            ElementKind::Paragraph,
            ElementKind::Authority,
            ElementKind::Source,
            ElementKind::EditorialNote,
            ElementKind::Citation,
            ElementKind::Other,
        ]
    );
    assert!(is_division_tag("DIV3"));
    assert!(!is_division_tag("DIVISION"));
    assert!(!is_division_tag("DIV"));
}

#[test]
fn context_tracks_most_recent_ancestors() {
    let xml = r#"<DIV1 TYPE="TITLE"><HEAD>Title 46—Shipping</HEAD>
        <DIV3 TYPE="CHAPTER"><HEAD>CHAPTER I—COAST GUARD</HEAD>
        <DIV4 TYPE="SUBCHAP"><HEAD>SUBCHAPTER A—PROCEDURES</HEAD>
        <DIV5 TYPE="PART"><HEAD>PART 1—ORGANIZATION</HEAD>
        <DIV6 TYPE="SUBPART"><HEAD>Subpart 1.01—General</HEAD>
        <DIV8 TYPE="SECTION"><HEAD>§ 1.01-1 Purpose.</HEAD></DIV8>
        <DIV8 TYPE="SECTION"><HEAD>§ 1.01-5 Scope.</HEAD></DIV8>
        </DIV6></DIV5></DIV4></DIV3></DIV1>"#;

    let (output, state) = render(xml);

    assert_eq!(
        state.context,
        ContextStack {
            title: "Title 46—Shipping".to_string(),
            chapter: "CHAPTER I—COAST GUARD".to_string(),
            part: "PART 1—ORGANIZATION".to_string(),
            subpart: "Subpart 1.01—General".to_string(),
            section: "§ 1.01-5 Scope.".to_string(),
        }
    );
    assert!(output.contains("\n### SUBCHAPTER A—PROCEDURES\n"));
    assert_eq!(state.stats.sections, 2);
    assert!(
        position(&output, "§ 1.01-1 Purpose.") < position(&output, "§ 1.01-5 Scope.")
    );
}

#[test]
fn inline_markup_maps_to_markers() {
    let text = inline_text(
        r#"<P>The <E T="04">master</E> may log H<SB>2</SB>O at 10<SU>3</SU> and <E T="02">must</E> sign <I>here</I> <B>now</B> <E T="07">plain</E> <E>term</E>.</P>"#,
    );
    assert_eq!(
        text,
        "The *master* may log H_2_O at 10^3^ and **must** sign *here* **now** plain *term*."
    );
}

#[test]
fn inline_text_whitespace_is_cleaned() {
    assert_eq!(
        inline_text("<P>  Vessels \n  must   comply .Next rule ; applies</P>"),
        "Vessels must comply. Next rule; applies"
    );
}

#[test]
fn paragraph_keywords_do_not_double_wrap_markup() {
    let xml = r#"<DIV8 TYPE="SECTION"><P>Owners <E T="02">shall</E> report and may appeal under 1.2.3.</P></DIV8>"#;
    let (output, _) = render(xml);
    assert_eq!(
        output,
        "\nOwners **shall** report and *may* appeal under **1.2.3**.\n"
    );
}

#[test]
fn document_gets_metadata_header_and_orphan_sections() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ECFR>
  <FDSYS><TITLE>Title 46 - Shipping</TITLE><IDNO TYPE="title">46</IDNO><AMDDATE>Jan. 1, 2024</AMDDATE></FDSYS>
  <DIV1 N="46" TYPE="TITLE"><HEAD>Title 46—Shipping</HEAD>
    <DIV5 N="1" TYPE="PART"><HEAD>PART 1—ORGANIZATION</HEAD>
      <DIV8 N="1.01" TYPE="SECTION"><HEAD>1.01</HEAD><P>Text here.</P></DIV8>
    </DIV5>
  </DIV1>
  <DIV8 N="2.01" TYPE="SECTION"><HEAD>2.01 Scope.</HEAD><P>Orphan text.</P></DIV8>
</ECFR>"#;

    let converter = EcfrConverter::new(EmphasisOptions::default()).expect("converter compiles");
    let conversion = converter.convert(xml).expect("document converts");
    let markdown = &conversion.markdown;

    assert!(markdown.starts_with(
        "# Title 46 - Shipping\n\n**Title:** 46\n**Last Updated:** Jan. 1, 2024\n\n---\n"
    ));
    assert_eq!(conversion.metadata.title_number.as_deref(), Some("46"));
    assert_eq!(conversion.orphan_sections, 1);
    assert_eq!(conversion.stats.sections, 2);

    let title = position(markdown, "\n# Title 46—Shipping\n");
    let part = position(markdown, "\n#### PART 1—ORGANIZATION\n");
    let section = position(markdown, "\n###### § 1.01\n");
    let orphan = position(markdown, "\n###### § 2.01 Scope.\n");
    assert!(title < part && part < section && section < orphan);
    assert!(markdown.contains("\nOrphan text.\n"));
    assert_eq!(conversion.context.part, "PART 1—ORGANIZATION");
}

#[test]
fn document_without_metadata_still_renders_separator() {
    let converter = EcfrConverter::new(EmphasisOptions::default()).expect("converter compiles");
    let conversion = converter
        .convert("<ECFR><DIV1 TYPE=\"TITLE\"><HEAD>Title 33</HEAD></DIV1></ECFR>")
        .expect("document converts");
    assert_eq!(conversion.markdown, "\n---\n\n\n# Title 33\n");
}

#[test]
fn malformed_xml_is_an_error() {
    let converter = EcfrConverter::new(EmphasisOptions::default()).expect("converter compiles");
    let error = converter
        .convert("<ECFR><DIV1 TYPE=\"TITLE\"></ECFR>")
        .expect_err("mismatched tags fail");
    assert!(format!("{error:#}").contains("failed to parse XML document"));
}
