//! Shared fixtures for the integration tests: HTML snippets shaped like the
//! BDTD (VuFind) markup, and mock-server mounting helpers.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One listing entry in the results page markup.
pub fn listing_entry(base: &str, id: &str, title: &str) -> String {
    format!(
        r#"<div class="media">
          <span class="format2">Dissertação</span>
          <a class="title getFull" href="/Record/{id}">{title}</a>
          <div id="rowAutor">
            <div>Autor:
              <a href="/Search/Results?lookfor=Silva&amp;type=Author">Silva, Maria</a>
            </div>
          </div>
          <div id="datePublish">Data de Defesa: 2021</div>
          <a class="fulltext" href="{base}/fulltext/{id}">Texto completo</a>
        </div>"#
    )
}

/// A full results page. `total_pages` > 1 adds a pagination block.
pub fn results_page(entries: &[String], total_pages: usize) -> String {
    let pagination = if total_pages > 1 {
        format!(
            r#"<ul class="pagination">
              <li><a href="?lookfor=x&amp;page=2">2</a></li>
              <li><a href="?lookfor=x&amp;page={total_pages}">Próximo »</a></li>
            </ul>"#
        )
    } else {
        String::new()
    };
    format!(
        "<html><body>{}{pagination}</body></html>",
        entries.join("\n")
    )
}

/// A record detail page.
pub fn record_page(title: &str, abstract_text: &str) -> String {
    format!(
        r#"<html><body>
        <div class="mainbody right">
          <h3 property="name">{title}</h3>
          <div class="col-sm-12"><p>{abstract_text}</p></div>
          <table summary="description">
            <tr><th>Autor:</th><td>Silva, Maria</td></tr>
            <tr><th>Idioma:</th><td>Português</td></tr>
          </table>
        </div>
        </body></html>"#
    )
}

/// Mount a 200 response for one results page index.
pub async fn mount_results_page(server: &MockServer, page: usize, body: String, expect: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/Search/Results"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body));
    match expect {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Mount a 200 response for one record detail page.
pub async fn mount_record_page(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/Record/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
