//! Page - the live document and the window onto it

use folio_dom::{Document, Viewport};
use folio_html::{HtmlParser, ParseError};
use url::Url;

/// A loaded page
#[derive(Debug)]
pub struct Page {
    pub document: Document,
    pub viewport: Viewport,
}

impl Page {
    pub fn new(document: Document, viewport: Viewport) -> Self {
        Self { document, viewport }
    }

    /// Parse `html` as the document at `url`
    pub fn parse(html: &str, url: &Url, viewport: Viewport) -> Result<Self, ParseError> {
        let document = HtmlParser::new().parse_with_url(html, url.as_str())?;
        Ok(Self::new(document, viewport))
    }

    /// Current document URL, if it is absolute
    pub fn url(&self) -> Option<Url> {
        Url::parse(self.document.url()).ok()
    }

    /// Get the page title
    pub fn title(&self) -> String {
        self.document.title()
    }

    /// Serialized document
    pub fn html(&self) -> String {
        folio_html::to_html(&self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let url = Url::parse("https://folio.test/work").unwrap();
        let page = Page::parse(
            "<title>Work</title><main><p>hi</p></main>",
            &url,
            Viewport::new(0.0, 1280.0, 800.0),
        ).unwrap();

        assert_eq!(page.url(), Some(url));
        assert_eq!(page.title(), "Work");
        assert!(page.html().contains("<main><p>hi</p></main>"));
    }
}
