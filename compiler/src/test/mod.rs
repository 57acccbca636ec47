mod compiler_test;
