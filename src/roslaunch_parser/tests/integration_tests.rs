use roslaunch_parser::{
    error::{SourceLocation, SubstitutionError},
    model::{NodeKind, ParamValue, RosparamOp},
    system::{MemoryFiles, StaticEnvironment, StaticPackages},
    xml::Element,
    ArgOrigin, ErrorKind, LaunchError, LaunchInterpreter, RuntimeModel, Scope,
};
use std::path::Path;

const MAIN: &str = "/ws/launch/main.launch";

fn interpreter(files: MemoryFiles) -> LaunchInterpreter {
    LaunchInterpreter::new()
        .with_files(files)
        .with_packages(StaticPackages::default().with_package("demo", "/ws/demo"))
        .with_environment(StaticEnvironment::default().with_var("ROBOT", "pr2"))
}

fn run(xml: &str) -> Result<RuntimeModel, LaunchError> {
    interpreter(MemoryFiles::new()).interpret_str(xml, Some(Path::new(MAIN)), [])
}

fn run_with(files: MemoryFiles, xml: &str) -> Result<RuntimeModel, LaunchError> {
    interpreter(files).interpret_str(xml, Some(Path::new(MAIN)), [])
}

#[test]
fn test_arg_feeds_node_args() {
    let model = run(r#"<launch><arg name="n" default="5"/><node pkg="p" type="t" name="x" args="$(arg n)"/></launch>"#)
        .unwrap();
    assert_eq!(model.nodes.len(), 1);
    assert_eq!(model.nodes[0].args, "5");
}

#[test]
fn test_group_namespace() {
    let model = run(r#"<launch><group ns="a"><node pkg="p" type="t" name="b"/></group></launch>"#).unwrap();
    assert_eq!(model.nodes[0].namespace, "/a");
    assert_eq!(model.nodes[0].name, "/a/b");
}

#[test]
fn test_eval_param_is_numeric() {
    let model = run(r#"<launch><param name="k" value="$(eval 2+3)"/></launch>"#).unwrap();
    assert_eq!(model.parameters.len(), 1);
    assert_eq!(model.parameters[0].name, "/k");
    assert_eq!(model.parameters[0].value, ParamValue::Int(5));
}

#[test]
fn test_arg_value_is_passed_verbatim() {
    let args = [("raw".to_string(), r#"a "quoted" \value with spaces"#.to_string())];
    let model = interpreter(MemoryFiles::new())
        .interpret_str(
            r#"<launch><arg name="raw"/><param name="p" type="str" value="$(arg raw)"/></launch>"#,
            None,
            args,
        )
        .unwrap();
    assert_eq!(
        model.parameters[0].value,
        ParamValue::Str(r#"a "quoted" \value with spaces"#.to_string())
    );
}

#[test]
fn test_dollar_escape() {
    let model = run(r#"<launch><param name="p" value="cost: $$(arg n)"/></launch>"#).unwrap();
    assert_eq!(
        model.parameters[0].value,
        ParamValue::Str("cost: $(arg n)".to_string())
    );
}

#[test]
fn test_anon_names_are_stable_within_a_run() {
    let model = run(
        r#"<launch>
            <node pkg="p" type="t" name="$(anon viewer)"/>
            <param name="viewer_name" value="$(anon viewer)"/>
            <node pkg="p" type="t" name="$(anon other)"/>
        </launch>"#,
    )
    .unwrap();
    let first = model.nodes[0].name.trim_start_matches('/');
    let other = model.nodes[1].name.trim_start_matches('/');
    assert!(first.starts_with("viewer_"));
    assert_eq!(
        model.param("/viewer_name").unwrap().value,
        ParamValue::Str(first.to_string())
    );
    assert_ne!(first, other);
}

#[test]
fn test_anon_names_are_shared_with_includes() {
    let files = MemoryFiles::new().with_file(
        "/ws/launch/child.launch",
        r#"<launch><param name="child_view" value="$(anon viewer)"/></launch>"#,
    );
    let model = run_with(
        files,
        r#"<launch>
            <param name="parent_view" value="$(anon viewer)"/>
            <include file="child.launch"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(
        model.param("/parent_view").unwrap().value,
        model.param("/child_view").unwrap().value
    );
}

#[test]
fn test_separate_runs_use_separate_registries() {
    let xml = r#"<launch><param name="p" value="$(anon seed)"/></launch>"#;
    let first = run(xml).unwrap();
    let second = run(xml).unwrap();
    assert_ne!(first.parameters[0].value, second.parameters[0].value);
}

#[test]
fn test_false_condition_discards_subtree() {
    let model = run(
        r#"<launch>
            <node pkg="p" type="t" name="skipped" if="false">
                <arg name="inner" default="1"/>
                <param name="rate" value="10"/>
            </node>
            <group if="false">
                <arg name="grouped" default="2"/>
                <param name="other" value="3"/>
            </group>
            <arg name="outer" default="ok"/>
        </launch>"#,
    )
    .unwrap();
    assert!(model.nodes.is_empty());
    assert!(model.parameters.is_empty());
    let names: Vec<_> = model.args.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["outer"]);
}

#[test]
fn test_false_condition_skips_errors_in_subtree() {
    let model = run(
        r#"<launch>
            <group unless="true">
                <node pkg="p" type="t" name="$(arg undeclared)"/>
            </group>
        </launch>"#,
    )
    .unwrap();
    assert!(model.nodes.is_empty());
}

#[test]
fn test_group_remap_is_scoped() {
    let model = run(
        r#"<launch>
            <group>
                <remap from="scan" to="base_scan"/>
                <node pkg="p" type="t" name="inside"/>
                <group ns="deep">
                    <node pkg="p" type="t" name="deeper"/>
                </group>
            </group>
            <node pkg="p" type="t" name="outside"/>
        </launch>"#,
    )
    .unwrap();
    let expected = vec![("/scan".to_string(), "/base_scan".to_string())];
    assert_eq!(model.node("/inside").unwrap().remaps, expected);
    assert_eq!(model.node("/deep/deeper").unwrap().remaps, expected);
    assert!(model.node("/outside").unwrap().remaps.is_empty());
}

#[test]
fn test_arg_redeclaration() {
    let model = run(
        r#"<launch>
            <arg name="a" default="1"/>
            <arg name="a" default="1"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.args["a"].value.as_deref(), Some("1"));

    let err = run(
        r#"<launch>
            <arg name="a" default="1"/>
            <arg name="a" default="2"/>
        </launch>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ArgConflict { name, existing, requested }
            if name == "a" && existing == "1" && requested == "2"
    ));
    assert_eq!(err.location.unwrap().line, 3);
}

#[test]
fn test_override_wins_over_default_but_not_value() {
    let xml_default = r#"<launch><arg name="a" default="1"/></launch>"#;
    let args = [("a".to_string(), "9".to_string())];
    let model = interpreter(MemoryFiles::new())
        .interpret_str(xml_default, None, args.clone())
        .unwrap();
    assert_eq!(model.args["a"].value.as_deref(), Some("9"));
    assert_eq!(model.args["a"].origin, ArgOrigin::Override);

    let xml_value = r#"<launch><arg name="a" value="1"/></launch>"#;
    let err = interpreter(MemoryFiles::new())
        .interpret_str(xml_value, None, args)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ArgConflict { .. }));
}

#[test]
fn test_include_binds_only_passed_args() {
    let files = MemoryFiles::new().with_file(
        "/ws/launch/child.launch",
        r#"<launch>
            <arg name="speed"/>
            <node pkg="p" type="t" name="drive" args="$(arg speed)"/>
        </launch>"#,
    );
    let model = run_with(
        files.clone(),
        r#"<launch>
            <arg name="speed" default="3"/>
            <arg name="private" default="x"/>
            <include file="$(dirname)/child.launch">
                <arg name="speed" value="$(arg speed)"/>
            </include>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.node("/drive").unwrap().args, "3");

    // Declared in the including file but never passed
    let files = files.with_file(
        "/ws/launch/leaky.launch",
        r#"<launch><param name="p" value="$(arg private)"/></launch>"#,
    );
    let err = run_with(
        files,
        r#"<launch>
            <arg name="private" default="x"/>
            <include file="leaky.launch"/>
        </launch>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::UndeclaredArgument(name)) if name == "private"
    ));
    let location = err.location.unwrap();
    assert_eq!(location.file.as_deref(), Some(Path::new("/ws/launch/leaky.launch")));
}

#[test]
fn test_include_pass_all_args() {
    let files = MemoryFiles::new().with_file(
        "/ws/launch/child.launch",
        r#"<launch>
            <arg name="a"/>
            <arg name="b" default="from_child"/>
            <param name="a" value="$(arg a)"/>
            <param name="b" value="$(arg b)"/>
        </launch>"#,
    );
    let model = run_with(
        files,
        r#"<launch>
            <arg name="a" default="from_parent"/>
            <arg name="b" default="parent_b"/>
            <include file="child.launch" pass_all_args="true">
                <arg name="b" value="explicit"/>
            </include>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(
        model.param("/a").unwrap().value,
        ParamValue::Str("from_parent".to_string())
    );
    assert_eq!(
        model.param("/b").unwrap().value,
        ParamValue::Str("explicit".to_string())
    );
}

#[test]
fn test_include_namespace_env_and_clear_params() {
    let files = MemoryFiles::new().with_file(
        "/ws/demo/launch/arm.launch",
        r#"<launch>
            <param name="reach" value="0.8"/>
            <node pkg="demo" type="arm" name="arm"/>
        </launch>"#,
    );
    let model = run_with(
        files,
        r#"<launch>
            <env name="OUTER" value="1"/>
            <include file="$(find demo)/launch/arm.launch" ns="left" clear_params="true">
                <env name="SIDE" value="left"/>
            </include>
        </launch>"#,
    )
    .unwrap();

    assert_eq!(model.rosparam_commands[0].op, RosparamOp::Delete);
    assert_eq!(model.rosparam_commands[0].namespace, "/left");
    assert_eq!(model.param("/left/reach").unwrap().value, ParamValue::Float(0.8));

    let arm = model.node("/left/arm").unwrap();
    assert_eq!(arm.env.get("SIDE").map(String::as_str), Some("left"));
    assert!(!arm.env.contains_key("OUTER"));
}

#[test]
fn test_include_arg_conditions_use_including_scope() {
    let files = MemoryFiles::new().with_file(
        "/ws/launch/child.launch",
        r#"<launch><arg name="mode" default="idle"/><param name="mode" value="$(arg mode)"/></launch>"#,
    );
    let model = run_with(
        files,
        r#"<launch>
            <arg name="fast" default="false"/>
            <include file="child.launch">
                <arg name="mode" value="sprint" if="$(arg fast)"/>
            </include>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(
        model.param("/mode").unwrap().value,
        ParamValue::Str("idle".to_string())
    );
}

#[test]
fn test_include_rejects_duplicate_args() {
    let child = r#"<launch><arg name="a"/><param name="a" value="$(arg a)"/></launch>"#;
    let err = run_with(
        MemoryFiles::new().with_file("/ws/inc.launch", child),
        r#"<launch>
            <include file="/ws/inc.launch">
                <arg name="a" value="1"/>
                <arg name="a" value="2"/>
            </include>
        </launch>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ArgConflict { name, existing, requested }
            if name == "a" && existing == "1" && requested == "2"
    ));
    assert_eq!(err.location.unwrap().line, 4);

    // Only one of the alternatives is active
    let model = run_with(
        MemoryFiles::new().with_file("/ws/inc.launch", child),
        r#"<launch>
            <arg name="fast" default="true"/>
            <include file="/ws/inc.launch">
                <arg name="a" value="sprint" if="$(arg fast)"/>
                <arg name="a" value="walk" unless="$(arg fast)"/>
            </include>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.param("/a").unwrap().value, ParamValue::Str("sprint".to_string()));

    // An explicit child may still override what pass_all_args forwarded
    let model = run_with(
        MemoryFiles::new().with_file("/ws/inc.launch", child),
        r#"<launch>
            <arg name="a" default="outer"/>
            <include file="/ws/inc.launch" pass_all_args="true">
                <arg name="a" value="inner"/>
            </include>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.param("/a").unwrap().value, ParamValue::Str("inner".to_string()));
}

#[test]
fn test_include_cycle() {
    let files = MemoryFiles::new()
        .with_file("/ws/launch/a.launch", r#"<launch><include file="b.launch"/></launch>"#)
        .with_file("/ws/launch/b.launch", r#"<launch><include file="a.launch"/></launch>"#);
    let err = interpreter(files)
        .interpret_file(Path::new("/ws/launch/a.launch"), [])
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::IncludeCycle(chain) if chain.len() == 3));
}

#[test]
fn test_same_file_included_twice_is_not_a_cycle() {
    let files = MemoryFiles::new().with_file(
        "/ws/launch/sensor.launch",
        r#"<launch><arg name="id"/><node pkg="p" type="t" name="sensor_$(arg id)"/></launch>"#,
    );
    let model = run_with(
        files,
        r#"<launch>
            <include file="sensor.launch"><arg name="id" value="1"/></include>
            <include file="sensor.launch"><arg name="id" value="2"/></include>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.nodes.len(), 2);
}

#[test]
fn test_node_children_and_params() {
    let model = run(
        r#"<launch>
            <param name="global_rate" value="1"/>
            <node pkg="demo" type="driver" name="driver" ns="hw" respawn="true" output="screen">
                <param name="port" value="/dev/ttyUSB0"/>
                <param name="~baud" value="115200"/>
                <rosparam>
                    timeout: 0.5
                </rosparam>
                <remap from="~cmd" to="/cmd"/>
                <env name="LOG_LEVEL" value="debug"/>
            </node>
            <param name="hw/driver/late" value="true"/>
        </launch>"#,
    )
    .unwrap();

    let driver = model.node("/hw/driver").unwrap();
    assert!(driver.respawn);
    assert_eq!(
        driver.params,
        vec![
            "/hw/driver/port".to_string(),
            "/hw/driver/baud".to_string(),
            "/hw/driver/timeout".to_string(),
            "/hw/driver/late".to_string(),
        ]
    );
    assert_eq!(
        driver.remaps,
        vec![("/hw/driver/cmd".to_string(), "/cmd".to_string())]
    );
    assert_eq!(driver.env.get("LOG_LEVEL").map(String::as_str), Some("debug"));
    assert_eq!(model.param("/hw/driver/baud").unwrap().value, ParamValue::Int(115200));
}

#[test]
fn test_node_clear_params_precede_its_params() {
    let model = run(
        r#"<launch>
            <node pkg="p" type="t" name="n" clear_params="true">
                <param name="a" value="1"/>
            </node>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.rosparam_commands.len(), 1);
    assert_eq!(model.rosparam_commands[0].op, RosparamOp::Delete);
    assert_eq!(model.rosparam_commands[0].namespace, "/n");
    assert_eq!(model.param("/n/a").unwrap().value, ParamValue::Int(1));
}

#[test]
fn test_later_param_wins() {
    let model = run(
        r#"<launch>
            <param name="p" value="1"/>
            <param name="p" value="2"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.parameters.len(), 1);
    assert_eq!(model.parameters[0].value, ParamValue::Int(2));
}

#[test]
fn test_env_scoping() {
    let model = run(
        r#"<launch>
            <group>
                <env name="ROBOT_MODE" value="$(env ROBOT)"/>
                <node pkg="p" type="t" name="inner"/>
            </group>
            <node pkg="p" type="t" name="outer"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(
        model.node("/inner").unwrap().env.get("ROBOT_MODE").map(String::as_str),
        Some("pr2")
    );
    assert!(model.node("/outer").unwrap().env.is_empty());
}

#[test]
fn test_default_machine_assignment() {
    let model = run(
        r#"<launch>
            <node pkg="p" type="t" name="first"/>
            <group>
                <machine name="remote" address="10.0.0.5" default="true"/>
                <machine name="spare" address="10.0.0.6" default="never"/>
                <node pkg="p" type="t" name="second"/>
                <node pkg="p" type="t" name="third" machine="spare"/>
            </group>
            <node pkg="p" type="t" name="fourth"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.node("/first").unwrap().machine, "local");
    assert_eq!(model.node("/second").unwrap().machine, "remote");
    assert_eq!(model.node("/third").unwrap().machine, "spare");
    assert_eq!(model.node("/fourth").unwrap().machine, "local");
    assert_eq!(model.machines.len(), 2);
    assert!(!model.machine("spare").unwrap().is_assignable());
}

#[test]
fn test_test_elements() {
    let model = run(
        r#"<launch>
            <node pkg="p" type="t" name="server"/>
            <test pkg="p" type="check" test-name="server_up" time-limit="30" retry="2"/>
        </launch>"#,
    )
    .unwrap();
    let tests: Vec<_> = model.tests().collect();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].name, "/server_up");
    assert_eq!(
        tests[0].kind,
        NodeKind::Test {
            test_name: "server_up".to_string(),
            retry: 2,
            time_limit: 30.0,
        }
    );
}

#[test]
fn test_interpret_hand_built_tree() {
    let location = SourceLocation::new(None, 1, 1);
    let root = Element::new("launch", location.clone())
        .with_child(
            Element::new("arg", location.clone())
                .with_attr("name", "robot")
                .with_attr("default", "pr2"),
        )
        .with_child(
            Element::new("node", location)
                .with_attr("pkg", "demo")
                .with_attr("type", "base")
                .with_attr("name", "$(arg robot)_base"),
        );
    let model = interpreter(MemoryFiles::new())
        .interpret(&root, Scope::new())
        .unwrap();
    assert_eq!(model.nodes[0].name, "/pr2_base");
    assert_eq!(model.args["robot"].origin, ArgOrigin::Default);
}
