//! End-to-end tests: source text through the lexer, parser, compiler and VM.

use std::io;
use zinc_core::Program;
use zinc_vm::{RuntimeError, Vm};

fn compile(source: &str) -> Program {
    zinc_compiler::compile_source(source).expect("program should compile")
}

fn run(source: &str) -> (String, i32) {
    run_with_input(source, "")
}

fn run_with_input(source: &str, input: &str) -> (String, i32) {
    let program = compile(source);
    let mut out = Vec::new();
    let code = {
        let cursor = io::Cursor::new(input.as_bytes().to_vec());
        let mut vm = Vm::with_io(&program, Box::new(cursor), Box::new(&mut out));
        vm.run()
    };
    (String::from_utf8(out).expect("output should be UTF-8"), code)
}

fn run_expect_error(source: &str) -> RuntimeError {
    let program = compile(source);
    let mut out = Vec::new();
    let cursor = io::Cursor::new(Vec::new());
    let mut vm = Vm::with_io(&program, Box::new(cursor), Box::new(&mut out));
    vm.execute().expect_err("program should fail at runtime")
}

#[test]
fn scenario_hello_world() {
    let (out, code) = run(
        "include the standard input and output\n\nto do the main thing:\n    say \"Hello, World!\"\nend\n",
    );
    assert_eq!(out, "Hello, World!\n");
    assert_eq!(code, 0);
}

#[test]
fn scenario_arithmetic_and_conditional() {
    let (out, code) = run(
        "to do the main thing:\n    there is a number called x which is 5\n    if x is greater than 3 then\n        say \"big\"\n    end\nend\n",
    );
    assert_eq!(out, "big\n");
    assert_eq!(code, 0);
}

#[test]
fn scenario_counted_loop() {
    let (out, _) = run(
        "to do the main thing:\n    for each number i from 1 to 3:\n        say i\n    end\nend\n",
    );
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn scenario_short_circuit_avoids_division_by_zero() {
    let (out, code) = run(
        "to do the main thing:\n    there is a number called n which is 0\n    if n is not equal to 0 and 10 divided by n is greater than 1 then\n        say \"yes\"\n    otherwise\n        say \"no\"\n    end\nend\n",
    );
    assert_eq!(out, "no\n");
    assert_eq!(code, 0);
}

#[test]
fn scenario_list_and_foreach() {
    let (out, _) = run(
        "to do the main thing:\n    there is a list of number called xs containing 10, 20, 30\n    for each number v in xs:\n        say v\n    end\nend\n",
    );
    assert_eq!(out, "10\n20\n30\n");
}

#[test]
fn scenario_out_of_bounds_is_a_runtime_error() {
    let source = "to do the main thing:\n    there is a list of number called xs containing 1, 2\n    say item number 5 in xs\nend\n";
    let err = run_expect_error(source);
    let message = err.to_string();
    assert!(message.contains("out of bounds"), "got: {}", message);
    assert!(message.contains("line 3"), "got: {}", message);

    let (_, code) = run_with_input(source, "");
    assert_ne!(code, 0);
}

// ---------------------------------------------------------------------
// Boundary behaviors
// ---------------------------------------------------------------------

#[test]
fn repeat_zero_times_runs_body_never() {
    let (out, _) = run(
        "to do the main thing:\n    say \"before\"\n    repeat 0 times:\n        say \"body\"\n    end\n    say \"after\"\nend\n",
    );
    assert_eq!(out, "before\nafter\n");
}

#[test]
fn empty_list_has_length_zero_and_is_empty() {
    let (out, _) = run(
        "to do the main thing:\n    there is a list of 0 number called xs\n    say the length of xs\n    if xs is empty then\n        say \"empty\"\n    end\nend\n",
    );
    assert_eq!(out, "0\nempty\n");
}

#[test]
fn negative_one_indexes_the_last_element() {
    let (out, _) = run(
        "to do the main thing:\n    there is a list of number called xs containing 7, 8, 9\n    say the last item in xs\n    change the last item in xs to 1\n    say item number 2 in xs\nend\n",
    );
    assert_eq!(out, "9\n1\n");
}

#[test]
fn degenerate_for_loop_runs_zero_iterations() {
    let (out, _) = run(
        "to do the main thing:\n    for each number i from 5 to 1:\n        say i\n    end\n    say \"done\"\nend\n",
    );
    assert_eq!(out, "done\n");
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let err = run_expect_error(
        "to do the main thing:\n    there is a number called n which is 0\n    say 10 divided by n\nend\n",
    );
    assert!(err.to_string().contains("Division by zero"));
}

#[test]
fn undefined_global_is_a_runtime_error() {
    let err = run_expect_error("to do the main thing:\n    say q\nend\n");
    assert!(err.to_string().contains("Undefined global variable: q"));
}

// ---------------------------------------------------------------------
// Language features across the whole pipeline
// ---------------------------------------------------------------------

#[test]
fn function_call_with_argument_and_return_value() {
    let (out, _) = run(
        "to twice number called n and return a number:\n    return n times 2\nend\n\nto do the main thing:\n    say the result of twice 21\nend\n",
    );
    assert_eq!(out, "42\n");
}

#[test]
fn recursive_function() {
    let (out, _) = run(
        "to factorial of number called n and return a number:\n    if n is at most 1 then\n        return 1\n    end\n    there is a number called m which is n minus 1\n    return n times the result of factorial of m\nend\n\nto do the main thing:\n    say the result of factorial of 5\nend\n",
    );
    assert_eq!(out, "120\n");
}

#[test]
fn while_loop_with_break() {
    let (out, _) = run(
        "to do the main thing:\n    there is a number called n which is 0\n    while yes:\n        add 1 to n\n        if n is at least 3 then\n            stop the loop\n        end\n    end\n    say n\nend\n",
    );
    assert_eq!(out, "3\n");
}

#[test]
fn continue_in_repeat_still_terminates() {
    let (out, _) = run(
        "to do the main thing:\n    there is a number called n which is 0\n    repeat 5 times:\n        add 1 to n\n        if n is even then\n            skip to the next one\n        end\n    end\n    say n\nend\n",
    );
    assert_eq!(out, "5\n");
}

#[test]
fn struct_fields_assign_and_read() {
    let (out, _) = run(
        "define Point as having:\n    number called x\n    number called y\nend\n\nto do the main thing:\n    there is a Point called p\n    change p's x to 3\n    change p's y to 4\n    say p's x plus p's y\nend\n",
    );
    assert_eq!(out, "7\n");
}

#[test]
fn pointer_passed_to_function_mutates_caller_local() {
    let (out, _) = run(
        "to bump a pointer to number called p:\n    change the value that p points to to 9\nend\n\nto do the main thing:\n    there is a number called x which is 1\n    let p be the address of x\n    the result of bump p\n    say x\nend\n",
    );
    assert_eq!(out, "9\n");
}

#[test]
fn string_concatenation_stringifies_numbers() {
    let (out, _) = run(
        "to do the main thing:\n    there is a number called n which is 7\n    say \"n = \" plus n\nend\n",
    );
    assert_eq!(out, "n = 7\n");
}

#[test]
fn print_with_multiple_parts() {
    let (out, _) = run(
        "to do the main thing:\n    say \"a\" and then \"b\" followed by \"c\"\nend\n",
    );
    assert_eq!(out, "abc\n");
}

#[test]
fn integer_and_float_arithmetic() {
    let (out, _) = run(
        "to do the main thing:\n    say 7 divided by 2\n    say 7.0 divided by 2\n    say 2 to the power of 10\n    say the square root of 9\nend\n",
    );
    assert_eq!(out, "3\n3.5\n1024\n3.0\n");
}

#[test]
fn between_and_predicate_comparisons() {
    let (out, _) = run(
        "to do the main thing:\n    there is a number called x which is 4\n    if x is between 1 and 10 then\n        say \"in\"\n    end\n    if x is even then\n        say \"even\"\n    end\n    if x is positive then\n        say \"pos\"\n    end\nend\n",
    );
    assert_eq!(out, "in\neven\npos\n");
}

#[test]
fn string_contains() {
    let (out, _) = run(
        "to do the main thing:\n    there is a text called s which is \"hello world\"\n    if s contains \"lo wo\" then\n        say \"found\"\n    end\nend\n",
    );
    assert_eq!(out, "found\n");
}

#[test]
fn input_reads_a_number() {
    let (out, code) = run_with_input(
        "to do the main thing:\n    there is a number called x which is 0\n    ask the user for a number and store it in x\n    say x plus 1\nend\n",
        "41\n",
    );
    assert_eq!(out, "42\n");
    assert_eq!(code, 0);
}

#[test]
fn stop_the_program_exits_with_one() {
    let (out, code) = run(
        "to do the main thing:\n    say \"before\"\n    stop the program\n    say \"after\"\nend\n",
    );
    assert_eq!(out, "before\n");
    assert_eq!(code, 1);
}

#[test]
fn main_returns_its_integer_as_exit_code() {
    let (_, code) = run("to do the main thing:\n    return 3\nend\n");
    assert_eq!(code, 3);
}

#[test]
fn else_if_chain_picks_first_matching_branch() {
    let (out, _) = run(
        "to do the main thing:\n    there is a number called x which is 15\n    if x is greater than 100 then\n        say \"huge\"\n    otherwise if x is greater than 10 then\n        say \"medium\"\n    otherwise\n        say \"small\"\n    end\nend\n",
    );
    assert_eq!(out, "medium\n");
}

#[test]
fn descending_loop_counts_down() {
    let (out, _) = run(
        "to do the main thing:\n    for each number i from 3 down to 1:\n        say i\n    end\nend\n",
    );
    assert_eq!(out, "3\n2\n1\n");
}

#[test]
fn booleans_print_as_yes_and_no() {
    let (out, _) = run(
        "to do the main thing:\n    there is a boolean called b which is yes\n    say b\n    change b to no\n    say b\nend\n",
    );
    assert_eq!(out, "yes\nno\n");
}

// ---------------------------------------------------------------------
// Disassembly and persistence
// ---------------------------------------------------------------------

#[test]
fn disassembly_has_expected_layout() {
    let program = compile(
        "define Point as having:\n    number called x\nend\n\nto do the main thing:\n    there is a number called x which is 5\n    say x\nend\n",
    );
    let text = program.disassemble();
    assert!(text.starts_with("=== Zinc Bytecode Disassembly ==="));
    assert!(text.contains("struct Point:"));
    assert!(text.contains("  number x"));
    assert!(text.contains("function main():"));
    assert!(text.contains("   0: PUSH_INT 5"));
}

#[test]
fn bytecode_round_trips_through_a_znc_file() {
    let source = "to do the main thing:\n    say \"persisted\"\nend\n";
    let program = compile(source);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.znc");
    std::fs::write(&path, program.to_bytes().unwrap()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let restored = Program::from_bytes(&bytes).unwrap();
    assert_eq!(program, restored);

    let mut out = Vec::new();
    let code = {
        let cursor = io::Cursor::new(Vec::new());
        let mut vm = Vm::with_io(&restored, Box::new(cursor), Box::new(&mut out));
        vm.run()
    };
    assert_eq!(String::from_utf8(out).unwrap(), "persisted\n");
    assert_eq!(code, 0);
}

#[test]
fn random_stays_in_range() {
    let (out, code) = run(
        "to do the main thing:\n    there is a number called r which is a random number between 1 and 6\n    if r is between 1 and 6 then\n        say \"ok\"\n    end\nend\n",
    );
    assert_eq!(out, "ok\n");
    assert_eq!(code, 0);
}
