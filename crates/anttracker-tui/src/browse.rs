// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anttracker_app::{Contact, Pager, Product, ProductId, Release};
use std::rc::Rc;

use crate::screen::{Screen, SelectRowScreen, TableScreen, goto};
use crate::table::{Column, TableCell};

const PRODUCT_COLUMNS: [Column; 2] = [Column::new("ID", 7), Column::new("Name", 30)];

const RELEASE_COLUMNS: [Column; 2] = [Column::new("Release", 8), Column::new("Release date", 12)];

const CONTACT_COLUMNS: [Column; 4] = [
    Column::new("Name", 32),
    Column::new("Email", 24),
    Column::new("Phone", 11),
    Column::new("Department", 12),
];

fn product_row(product: &Product) -> Vec<TableCell> {
    vec![
        TableCell::Integer(product.id.get()),
        TableCell::text(product.name.as_str()),
    ]
}

fn release_row(release: &Release) -> Vec<TableCell> {
    vec![
        TableCell::text(release.name.as_str()),
        TableCell::Date(release.release_date),
    ]
}

fn contact_row(contact: &Contact) -> Vec<TableCell> {
    vec![
        TableCell::text(contact.name.as_str()),
        TableCell::text(contact.email.as_str()),
        TableCell::text(contact.phone.as_str()),
        TableCell::text(contact.department.as_str()),
    ]
}

pub fn all_products() -> Rc<dyn Screen> {
    products(Pager::new(0))
}

pub fn all_contacts() -> Rc<dyn Screen> {
    contacts(Pager::new(0))
}

fn products(pager: Pager) -> Rc<dyn Screen> {
    TableScreen::<Product>::builder("Products", pager, product_row, products)
        .columns(&PRODUCT_COLUMNS)
        .query(
            |runtime| runtime.count_products(),
            |runtime, pager| runtime.fetch_products(pager.offset(), pager.limit()),
        )
        .empty_message("No products found.")
        .row_option("View releases", |_ctx, rows, pager| {
            Ok(Some(SelectRowScreen::screen(
                "Enter the row number of the product whose releases you want to view.",
                rows,
                |product: &Product| releases(product.id, product.name.clone(), Pager::new(0)),
                products(pager),
            )))
        })
        .screen()
}

fn releases(product_id: ProductId, product: String, pager: Pager) -> Rc<dyn Screen> {
    let title = format!("Releases of {product}");
    TableScreen::<Release>::builder(title, pager, release_row, move |next| {
        releases(product_id, product.clone(), next)
    })
    .columns(&RELEASE_COLUMNS)
    .query(
        move |runtime| runtime.count_releases(product_id),
        move |runtime, pager| runtime.fetch_releases(product_id, pager.offset(), pager.limit()),
    )
    .empty_message("No releases found.")
    .option("Back to products", goto(all_products))
    .on_abort(goto(all_products))
    .screen()
}

fn contacts(pager: Pager) -> Rc<dyn Screen> {
    TableScreen::<Contact>::builder("Contacts", pager, contact_row, contacts)
        .columns(&CONTACT_COLUMNS)
        .query(
            |runtime| runtime.count_contacts(),
            |runtime, pager| runtime.fetch_contacts(pager.offset(), pager.limit()),
        )
        .empty_message("No contacts found.")
        .screen()
}
