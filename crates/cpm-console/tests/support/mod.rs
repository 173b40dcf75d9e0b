//! Shared page fixtures for console integration tests.

#![allow(dead_code)]

use cpm_console::testing::TestConsole;
use cpm_console::ConsoleConfig;
use cpm_core::ElementSpec;

// ============================================================================
// Page fragments
// ============================================================================

/// A row of the sites table with a guarded delete button.
pub fn site_row(id: u32, domain: &str) -> ElementSpec {
    ElementSpec::new("tr")
        .id(format!("site-{id}"))
        .child(ElementSpec::new("td").text(domain))
        .child(
            ElementSpec::new("td").child(
                ElementSpec::new("button")
                    .id(format!("delete-{id}"))
                    .class("btn btn-danger")
                    .attr("hx-delete", format!("/sites/{id}"))
                    .attr("hx-target", format!("#site-{id}"))
                    .attr("hx-confirm", "Delete this item?")
                    .child(ElementSpec::new("span").id(format!("delete-{id}-label")).text("Delete")),
            ),
        )
}

pub fn search_input() -> ElementSpec {
    ElementSpec::new("input")
        .id("search-input")
        .attr("type", "search")
        .attr("hx-get", "/sites/search")
        .attr("hx-trigger", "search")
        .attr("hx-target", "#sites")
}

pub fn modal(id: &str) -> ElementSpec {
    ElementSpec::new("div")
        .id(id)
        .class("modal-overlay hidden")
        .child(
            ElementSpec::new("div")
                .id(format!("{id}-content"))
                .class("modal")
                .child(ElementSpec::new("h2").text("Edit site"))
                .child(ElementSpec::new("input").id(format!("{id}-field"))),
        )
}

pub fn tabs() -> ElementSpec {
    ElementSpec::new("nav")
        .class("tabs")
        .child(ElementSpec::new("a").id("tab-sites").class("tab active").text("Sites"))
        .child(ElementSpec::new("a").id("tab-routes").class("tab").text("Routes"))
        .child(ElementSpec::new("a").id("tab-logs").class("tab").text("Logs"))
}

pub fn login_form() -> ElementSpec {
    ElementSpec::new("form")
        .id("login")
        .attr("data-validate", "")
        .attr("hx-post", "/login")
        .child(ElementSpec::new("input").id("username").attr("required", ""))
        .child(
            ElementSpec::new("input")
                .id("password")
                .attr("type", "password")
                .attr("required", ""),
        )
        .child(
            ElementSpec::new("button")
                .id("show-password")
                .attr("type", "button")
                .attr("data-toggle-password", "password")
                .text("👁️"),
        )
}

pub fn flash_messages(messages: &[&str]) -> ElementSpec {
    messages.iter().fold(ElementSpec::new("div").id("flash-messages"), |container, text| {
        container.child(ElementSpec::new("div").class("alert alert-success").text(*text))
    })
}

pub fn api_key_row() -> ElementSpec {
    ElementSpec::new("div")
        .id("api-key")
        .child(ElementSpec::new("code").text("cpm_4f2a9c"))
        .child(
            ElementSpec::new("button")
                .id("copy-key")
                .attr("data-copy", "cpm_4f2a9c")
                .text("Copy"),
        )
}

/// The sites page: search box, table with two guarded rows, an edit modal.
pub fn sites_page() -> Vec<ElementSpec> {
    vec![
        search_input(),
        ElementSpec::new("table").child(
            ElementSpec::new("tbody")
                .id("sites")
                .child(site_row(1, "example.com"))
                .child(site_row(2, "api.example.com")),
        ),
        modal("edit-modal"),
        modal("confirm-modal"),
    ]
}

// ============================================================================
// Consoles
// ============================================================================

pub fn sites_console() -> TestConsole {
    TestConsole::with_body(&sites_page())
}

pub fn console_with(config: ConsoleConfig, body: &[ElementSpec]) -> TestConsole {
    TestConsole::with_config(config, body)
}
