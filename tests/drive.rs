use graph_dataset_manager::drive::{confirmation_url, direct_url, file_id, is_drive_url};

const VIRUS_SCAN_PAGE: &str = r#"<!DOCTYPE html><html><head><title>Google Drive - Virus scan warning</title></head>
<body><div class="uc-main"><p class="uc-warning-caption">Google Drive can't scan this file for viruses.</p>
<form id="download-form" action="https://drive.usercontent.google.com/download" method="get">
<input type="submit" id="uc-download-link" class="goog-inline-block jfk-button" value="Download anyway"/>
<input type="hidden" name="id" value="1AbC_d-9">
<input type="hidden" name="export" value="download">
<input type="hidden" name="confirm" value="t">
<input type="hidden" name="uuid" value="5f0e-42aa">
</form></div></body></html>"#;

const LEGACY_PAGE: &str = r#"<html><body>
<a id="uc-download-link" class="goog-inline-block jfk-button" href="/uc?export=download&amp;confirm=Xy_z&amp;id=1AbC_d-9">Download anyway</a>
</body></html>"#;

#[test]
fn share_links_become_download_urls() {
    assert_eq!(
        direct_url("https://drive.google.com/file/d/1AbC_d-9/view?usp=sharing"),
        "https://drive.google.com/uc?export=download&id=1AbC_d-9"
    );
    assert_eq!(
        direct_url("https://drive.google.com/open?id=1AbC_d-9"),
        "https://drive.google.com/uc?export=download&id=1AbC_d-9"
    );
    assert_eq!(
        file_id("https://drive.google.com/uc?export=download&id=1AbC_d-9").as_deref(),
        Some("1AbC_d-9")
    );
}

#[test]
fn other_hosts_are_left_alone() {
    let url = "https://example.org/file/d/graph/view";
    assert!(!is_drive_url(url));
    assert_eq!(direct_url(url), url);
    assert_eq!(file_id(url), None);
    assert!(is_drive_url("https://drive.usercontent.google.com/download?id=x"));
}

#[test]
fn download_form_is_followed() {
    let next = confirmation_url(
        VIRUS_SCAN_PAGE,
        "https://drive.google.com/uc?export=download&id=1AbC_d-9",
    );
    assert_eq!(
        next.as_deref(),
        Some(
            "https://drive.usercontent.google.com/download?id=1AbC_d-9&export=download&confirm=t&uuid=5f0e-42aa"
        )
    );
}

#[test]
fn legacy_confirm_link_is_followed() {
    let next = confirmation_url(
        LEGACY_PAGE,
        "https://drive.google.com/uc?export=download&id=1AbC_d-9",
    );
    assert_eq!(
        next.as_deref(),
        Some("https://drive.google.com/uc?export=download&confirm=Xy_z&id=1AbC_d-9")
    );
}

#[test]
fn bare_confirm_token_is_appended() {
    let next = confirmation_url(
        "<script>var url = '/uc?id=1AbC_d-9\\u0026confirm=Q1w2';</script>",
        "https://drive.google.com/uc?export=download&id=1AbC_d-9",
    );
    assert_eq!(
        next.as_deref(),
        Some("https://drive.google.com/uc?export=download&id=1AbC_d-9&confirm=Q1w2")
    );
}

#[test]
fn page_without_confirmation_gives_none() {
    let page = "<html><body>Sorry, the file you have requested does not exist.</body></html>";
    assert_eq!(
        confirmation_url(page, "https://drive.google.com/uc?export=download&id=x"),
        None
    );
}
