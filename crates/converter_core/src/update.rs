use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputsAdded(inputs) => {
            if inputs.is_empty() {
                return (state, Vec::new());
            }
            let batch_id = state.begin_ingest();
            vec![Effect::Ingest { batch_id, inputs }]
        }
        Msg::IngestFinished {
            batch_id,
            items,
            issues,
        } => {
            state.finish_ingest(batch_id, items, issues);
            Vec::new()
        }
        Msg::SurfaceReady => {
            state.mark_surface_ready();
            Vec::new()
        }
        Msg::InputFormatSelected(token) => {
            state.set_input_format(token);
            Vec::new()
        }
        Msg::OutputFormatSelected(target) => {
            state.set_output_format(target);
            Vec::new()
        }
        Msg::ConvertOneRequested { id, target } => {
            state.start_single(id, target).into_iter().collect()
        }
        Msg::ConvertAllRequested { target } => state.start_batch(target).into_iter().collect(),
        Msg::ConversionFinished { id, result } => {
            state.apply_conversion_result(id, result);
            // The batch advances even if its in-flight item was removed meanwhile.
            state.advance_batch(id).into_iter().collect()
        }
        Msg::RemoveItem(id) => {
            state.remove_item(id);
            Vec::new()
        }
        Msg::ResetAll => {
            state.reset();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
