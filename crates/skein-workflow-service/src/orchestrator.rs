//! The execution orchestrator
//!
//! Composes the graph model, node registry, provider registry, credit
//! ledger, and execution store into the run state machine:
//!
//! 1. Validate the graph; any error refuses the run before a single
//!    side effect.
//! 2. Order the nodes topologically, restricted to the requested subset
//!    plus its upstream closure.
//! 3. Walk the order sequentially: gather inputs from upstream outputs,
//!    reserve the estimated cost, call the provider chain, record the
//!    execution, and propagate outputs downstream.
//! 4. Fail fast on the first node failure: completed records and their
//!    charges stay in place, the failed node's reservation is refunded,
//!    and nothing further is scheduled.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use node_engine::{
    execution_subset, propagate, topological_sort, validate_workflow, EventSink, GraphNode,
    NodeCategory, NodeConfig, NodeRegistry, RunEvent, WorkflowGraph,
};
use providers::{ExecuteOptions, ProviderRegistry};
use skein_credit_ledger::{CreditLedger, Credits};

use crate::error::{Result, WorkflowError};
use crate::execution::{RunResult, RunStatus, WorkflowExecution};
use crate::store::ExecutionStore;

/// A request to run a workflow, or a selected subset of it
pub struct RunRequest {
    /// Workflow the graph belongs to
    pub workflow_id: String,
    /// User whose credits fund the run
    pub user_id: String,
    /// The graph to execute
    pub graph: WorkflowGraph,
    /// Restrict execution to these nodes (their upstream dependencies are
    /// pulled in automatically). `None` runs the whole graph.
    pub selection: Option<Vec<String>>,
    /// Cooperative cancellation flag, checked between nodes and passed to
    /// providers
    pub abort: Option<Arc<AtomicBool>>,
}

impl RunRequest {
    /// Run the whole graph
    pub fn new(
        workflow_id: impl Into<String>,
        user_id: impl Into<String>,
        graph: WorkflowGraph,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            user_id: user_id.into(),
            graph,
            selection: None,
            abort: None,
        }
    }

    /// Restrict the run to the given nodes plus their upstream closure
    pub fn with_selection(mut self, selection: Vec<String>) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Attach a cancellation flag
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }
}

/// Coordinates one run of a workflow graph
///
/// All collaborators are injected; the orchestrator holds no global
/// state, so independent runs, same workflow or different users, only
/// contend on the ledger's atomic balance discipline.
pub struct ExecutionOrchestrator {
    registry: Arc<NodeRegistry>,
    providers: Arc<ProviderRegistry>,
    ledger: CreditLedger,
    executions: Arc<dyn ExecutionStore>,
    events: Arc<dyn EventSink>,
}

impl ExecutionOrchestrator {
    /// Create an orchestrator from its collaborators
    pub fn new(
        registry: Arc<NodeRegistry>,
        providers: Arc<ProviderRegistry>,
        ledger: CreditLedger,
        executions: Arc<dyn ExecutionStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            providers,
            ledger,
            executions,
            events,
        }
    }

    /// Execute a workflow run.
    ///
    /// Returns `Err` only for refusals before any side effect (validation
    /// failures, unknown nodes). Once execution starts, failures land on
    /// the node's record and surface as a failed [`RunResult`] with
    /// partial results preserved.
    pub async fn run(&self, request: RunRequest) -> Result<RunResult> {
        let RunRequest {
            workflow_id,
            user_id,
            graph,
            selection,
            abort,
        } = request;

        // 1. Refuse invalid graphs outright: cycles, type mismatches,
        //    unregistered node types.
        let errors = validate_workflow(&graph, Some(&self.registry));
        if !errors.is_empty() {
            return Err(WorkflowError::Validation(errors));
        }
        if let Some(selection) = &selection {
            for node_id in selection {
                if graph.find_node(node_id).is_none() {
                    return Err(WorkflowError::NodeNotFound(node_id.clone()));
                }
            }
        }

        // 2. Topological order restricted to the selection's closure.
        let order = topological_sort(&graph).map_err(|e| WorkflowError::Validation(vec![e]))?;
        let order: Vec<String> = match &selection {
            Some(selected) => {
                let required: HashSet<String> = execution_subset(&graph, selected.iter());
                order.into_iter().filter(|n| required.contains(n)).collect()
            }
            None => order,
        };

        let run_id = uuid::Uuid::new_v4().to_string();
        let mut working = graph;
        let mut outputs: HashMap<String, HashMap<String, serde_json::Value>> = HashMap::new();
        let options = ExecuteOptions {
            timeout: None,
            abort: abort.clone(),
        };

        log::info!(
            "run '{}' of workflow '{}' starting: {} node(s)",
            run_id,
            workflow_id,
            order.len()
        );
        self.emit(RunEvent::RunStarted {
            workflow_id: workflow_id.clone(),
            run_id: run_id.clone(),
            node_count: order.len(),
        });

        // 3. Walk the order sequentially.
        for node_id in order {
            if abort
                .as_ref()
                .map(|flag| flag.load(Ordering::Relaxed))
                .unwrap_or(false)
            {
                return Ok(self.halt(run_id, workflow_id, "run cancelled".to_string(), working));
            }

            let node = working
                .find_node(&node_id)
                .cloned()
                .ok_or_else(|| WorkflowError::NodeNotFound(node_id.clone()))?;
            let config = self
                .registry
                .get(&node.node_type)
                .cloned()
                .ok_or_else(|| WorkflowError::UnknownNodeType(node.node_type.clone()))?;

            let inputs = gather_inputs(&working, &node, &config, &outputs);

            // 4. Source input nodes complete the moment the run reaches
            //    them: literal value out, zero cost, audit record kept.
            let is_source = config.category == NodeCategory::Input
                && working.incoming_edges(&node_id).next().is_none();
            if is_source {
                let node_outputs = local_outputs(&config, &inputs);
                let record = WorkflowExecution::completed_source(
                    &workflow_id,
                    &node_id,
                    &run_id,
                    json_object(&node_outputs),
                );
                self.executions.insert(record.clone());
                self.emit(RunEvent::NodeCompleted {
                    run_id: run_id.clone(),
                    node_id: node_id.clone(),
                    execution_id: record.id.clone(),
                    output: record.output.clone(),
                });
                apply_propagation(&mut working, &node_id, &node_outputs);
                outputs.insert(node_id.clone(), node_outputs);
                continue;
            }

            let mut record = WorkflowExecution::running(
                &workflow_id,
                &node_id,
                &run_id,
                json_object(&inputs),
            );
            self.executions.insert(record.clone());
            self.emit(RunEvent::NodeStarted {
                run_id: run_id.clone(),
                node_id: node_id.clone(),
                execution_id: record.id.clone(),
            });

            // Reserve the estimate before the provider is ever invoked;
            // a low balance blocks the work from starting.
            let estimate = self
                .registry
                .estimate_cost(&node.node_type, &inputs)
                .unwrap_or(0);
            let mut reserved: Option<Credits> = None;
            if estimate > 0 {
                let amount = Credits::from_units(estimate);
                match self.ledger.reserve(&user_id, amount, &record.id, &node_id) {
                    Ok(_) => reserved = Some(amount),
                    Err(err) => {
                        let message = err.to_string();
                        record.error_code = Some("insufficient-credits".to_string());
                        record.fail(&message);
                        self.executions.update(&record);
                        self.emit(RunEvent::NodeFailed {
                            run_id: run_id.clone(),
                            node_id: node_id.clone(),
                            execution_id: record.id.clone(),
                            error: message.clone(),
                        });
                        return Ok(self.halt(run_id, workflow_id, message, working));
                    }
                }
            }

            // Input/output nodes execute locally; everything else goes
            // through the provider chain.
            let call = if matches!(config.category, NodeCategory::Input | NodeCategory::Output) {
                Ok((local_outputs(&config, &inputs), None, None))
            } else {
                self.providers
                    .execute_with_fallback(&node.node_type, inputs.clone(), &options)
                    .await
                    .map(|r| (r.outputs, Some(r.provider), r.actual_cost))
            };

            match call {
                Ok((node_outputs, provider, actual_cost)) => {
                    // Settlement policy: the reservation is the final
                    // charge; a provider-reported cost is stored on the
                    // record for audit only.
                    record.provider = provider;
                    record.actual_cost = actual_cost.map(Credits::from_units);
                    record.complete(json_object(&node_outputs));
                    self.executions.update(&record);
                    self.emit(RunEvent::NodeCompleted {
                        run_id: run_id.clone(),
                        node_id: node_id.clone(),
                        execution_id: record.id.clone(),
                        output: record.output.clone(),
                    });
                    apply_propagation(&mut working, &node_id, &node_outputs);
                    outputs.insert(node_id.clone(), node_outputs);
                }
                Err(err) => {
                    // The reservation was taken but no work was billed
                    // upstream; return it before halting.
                    if let Some(amount) = reserved {
                        if let Err(refund_err) =
                            self.ledger
                                .refund(&user_id, amount, &record.id, &err.to_string())
                        {
                            log::error!(
                                "refund of {} for execution '{}' failed: {}",
                                amount,
                                record.id,
                                refund_err
                            );
                        }
                    }
                    let message = err.to_string();
                    record.error_code = Some(err.code.as_str().to_string());
                    record.fail(&message);
                    self.executions.update(&record);
                    self.emit(RunEvent::NodeFailed {
                        run_id: run_id.clone(),
                        node_id: node_id.clone(),
                        execution_id: record.id.clone(),
                        error: message.clone(),
                    });
                    return Ok(self.halt(run_id, workflow_id, message, working));
                }
            }
        }

        self.emit(RunEvent::RunCompleted {
            workflow_id: workflow_id.clone(),
            run_id: run_id.clone(),
        });
        log::info!("run '{}' completed", run_id);

        Ok(RunResult {
            executions: self.executions.by_run(&run_id),
            run_id,
            workflow_id,
            status: RunStatus::Completed,
            error: None,
            graph: working,
        })
    }

    /// Stop the run after a node failure, preserving completed records
    fn halt(
        &self,
        run_id: String,
        workflow_id: String,
        error: String,
        graph: WorkflowGraph,
    ) -> RunResult {
        log::warn!("run '{}' halted: {}", run_id, error);
        self.emit(RunEvent::RunFailed {
            workflow_id: workflow_id.clone(),
            run_id: run_id.clone(),
            error: error.clone(),
        });
        RunResult {
            executions: self.executions.by_run(&run_id),
            run_id,
            workflow_id,
            status: RunStatus::Failed,
            error: Some(error),
            graph,
        }
    }

    /// Best-effort event delivery; a closed sink never fails a run
    fn emit(&self, event: RunEvent) {
        if let Err(err) = self.events.send(event) {
            log::debug!("run event dropped: {}", err);
        }
    }
}

/// Resolve a node's inputs for execution.
///
/// Layering, lowest precedence first: parameter defaults, the config's
/// default values, the node's own data, then connected upstream outputs.
/// Fan-in policy per handle: a `multiple` handle collects every incoming
/// value into an array in edge order (replacing any data-provided value);
/// a scalar handle takes the first connected edge's value and ignores the
/// rest.
fn gather_inputs(
    graph: &WorkflowGraph,
    node: &GraphNode,
    config: &NodeConfig,
    outputs: &HashMap<String, HashMap<String, serde_json::Value>>,
) -> HashMap<String, serde_json::Value> {
    let mut inputs: HashMap<String, serde_json::Value> = HashMap::new();

    for param in &config.parameters {
        if let Some(default) = &param.default_value {
            inputs.insert(param.id.clone(), default.clone());
        }
    }
    for (key, value) in &config.default_values {
        inputs.insert(key.clone(), value.clone());
    }
    if let Some(data) = node.data.as_object() {
        for (key, value) in data {
            inputs.insert(key.clone(), value.clone());
        }
    }

    let mut accumulated: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
    let mut scalar_taken: HashSet<String> = HashSet::new();

    for edge in graph.incoming_edges(&node.id) {
        let Some(value) = outputs
            .get(&edge.source)
            .and_then(|source_outputs| source_outputs.get(&edge.source_handle))
        else {
            log::debug!(
                "edge '{}': upstream '{}' produced no '{}' output",
                edge.id,
                edge.source,
                edge.source_handle
            );
            continue;
        };

        let multiple = config
            .resolve_input_handle(&edge.target_handle)
            .map(|h| h.multiple)
            .unwrap_or(false);

        if multiple {
            accumulated
                .entry(edge.target_handle.clone())
                .or_default()
                .push(value.clone());
        } else if scalar_taken.insert(edge.target_handle.clone()) {
            inputs.insert(edge.target_handle.clone(), value.clone());
        }
    }

    for (handle, values) in accumulated {
        inputs.insert(handle, serde_json::Value::Array(values));
    }

    inputs
}

/// Execute an input/output node locally: each declared output handle
/// takes the input with the same ID, falling back to the node's `value`
/// parameter.
fn local_outputs(
    config: &NodeConfig,
    inputs: &HashMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
    let mut outputs = HashMap::new();
    for handle in &config.outputs {
        let value = inputs.get(&handle.id).or_else(|| inputs.get("value"));
        if let Some(value) = value {
            outputs.insert(handle.id.clone(), value.clone());
        }
    }
    outputs
}

/// Write a node's outputs into its downstream neighbors' data, so later
/// nodes in the same pass (and the editor afterwards) see up-to-date
/// values.
fn apply_propagation(
    graph: &mut WorkflowGraph,
    node_id: &str,
    outputs: &HashMap<String, serde_json::Value>,
) {
    let writes = propagate(graph, node_id, outputs);
    for write in writes {
        if let Some(target) = graph.find_node_mut(&write.target) {
            target.set_data_value(write.target_handle, write.value);
        }
    }
}

fn json_object(map: &HashMap<String, serde_json::Value>) -> serde_json::Value {
    serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}
