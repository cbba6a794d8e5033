use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlInputElement, Url};

use crate::state::State;
use crate::utils::log;

// Wires up the file input so an uploaded photo starts a fresh puzzle.
pub fn attach_file_input(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    if let Some(input) = doc.get_element_by_id("file") {
        let input: HtmlInputElement = input.dyn_into().unwrap();
        let input_for_closure = input.clone();
        let st = state.clone();
        let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
            let Some(files) = input_for_closure.files() else {
                log("No file list on input");
                return;
            };
            if files.length() == 0 {
                log("No file selected");
                return;
            }
            let file = files.item(0).unwrap();
            match Url::create_object_url_with_blob(&file) {
                Ok(url) => crate::load_image_and_start(st.clone(), url),
                Err(e) => log(&format!("Failed to create object URL: {e:?}")),
            }
        }));
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();
    }
    Ok(())
}
